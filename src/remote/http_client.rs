use super::*;

impl StoreInner {
    pub(super) fn auth(&self) -> Result<String, StoreError> {
        Ok(format!("Bearer {}", self.token()?))
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Classifies a remote response. 403 and 404 become a permission failure
    /// and invalidate the credential store; every other error status surfaces
    /// as a transport failure.
    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        resource: &str,
    ) -> Result<reqwest::blocking::Response, StoreError> {
        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::NOT_FOUND {
            self.invalidate();
            return Err(StoreError::Permission {
                resource: resource.to_string(),
            });
        }
        resp.error_for_status()
            .map_err(|e| StoreError::transport(resource, e))
    }
}
