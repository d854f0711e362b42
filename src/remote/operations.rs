//! Domain operations issued against the remote file store.

use super::*;

impl RemoteStore {
    fn run<T: Send + Sync + 'static>(
        &self,
        work: impl FnOnce() -> Result<T, StoreError> + Send + 'static,
    ) -> Operation<T> {
        let op = Operation::new(work);
        op.execute(&self.inner.exec);
        op
    }

    /// Streams the bytes of a remote object. Accepts a bare locator or any
    /// URL containing `id=`; the metadata lookup records the object's display
    /// name as a side effect.
    pub fn download(&self, locator: &str) -> Operation<Vec<u8>> {
        let id = Locator::normalize(locator);
        let inner = Arc::clone(&self.inner);
        self.run(move || inner.fetch_bytes(&id))
    }

    /// Creates a remote object under `folder`, then applies the fixed sharing
    /// policy as a second, non-atomic step. A failure between the two steps
    /// leaves a private orphan object behind.
    pub fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime: &str,
        folder: &Locator,
    ) -> Operation<Locator> {
        let name = name.to_string();
        let mime = mime.to_string();
        let folder = folder.clone();
        let inner = Arc::clone(&self.inner);
        self.run(move || {
            let meta = inner.create_object(&name, bytes, &mime, &folder)?;
            inner.share(&meta.id)?;
            Ok(Locator(meta.id))
        })
    }

    /// Overwrites an existing object's content in place, keeping its locator.
    pub fn update(&self, locator: &str, bytes: Vec<u8>, mime: &str) -> Operation<Locator> {
        let id = Locator::normalize(locator);
        let mime = mime.to_string();
        let inner = Arc::clone(&self.inner);
        self.run(move || inner.update_object(&id, bytes, &mime).map(|m| Locator(m.id)))
    }

    pub fn create_folder(&self, parent: &str, name: &str) -> Operation<Locator> {
        let parent = Locator::normalize(parent);
        let name = name.to_string();
        let inner = Arc::clone(&self.inner);
        self.run(move || inner.make_folder(&parent, &name).map(|m| Locator(m.id)))
    }

    /// Succeeds with `true` when the object is fetchable by this session; a
    /// missing or forbidden object fails through the permission channel.
    pub fn exists(&self, locator: &str) -> Operation<bool> {
        let id = Locator::normalize(locator);
        let inner = Arc::clone(&self.inner);
        self.run(move || inner.fetch_meta(&id).map(|_| true))
    }

    pub fn is_folder(&self, locator: &str) -> Operation<bool> {
        let id = Locator::normalize(locator);
        let inner = Arc::clone(&self.inner);
        self.run(move || inner.fetch_meta(&id).map(|m| m.mime_type == FOLDER_MIME))
    }

    /// Resolves a locator to its display name. A cache hit completes without
    /// contacting the remote service.
    pub fn resolve_name(&self, locator: &str) -> Operation<String> {
        let id = Locator::normalize(locator);
        if let Some(name) = self.inner.cached_name(id.as_str()) {
            return self.run(move || Ok(name));
        }
        let inner = Arc::clone(&self.inner);
        self.run(move || inner.fetch_meta(&id).map(|m| m.name))
    }
}

impl StoreInner {
    pub(super) fn fetch_meta(&self, id: &Locator) -> Result<RemoteFile, StoreError> {
        let resource = self.describe(id.as_str());
        let resp = self
            .http
            .get(self.url(&format!("/files/{}", id)))
            .header(reqwest::header::AUTHORIZATION, self.auth()?)
            .send()
            .map_err(|e| StoreError::transport(&resource, e))?;
        let meta: RemoteFile = self
            .ensure_ok(resp, &resource)?
            .json()
            .map_err(|e| StoreError::transport("parse file metadata", e))?;
        self.remember_name(&meta.id, &meta.name);
        Ok(meta)
    }

    fn fetch_bytes(&self, id: &Locator) -> Result<Vec<u8>, StoreError> {
        let meta = self.fetch_meta(id)?;
        let resource = format!("{} ({})", meta.name, meta.id);
        let resp = self
            .http
            .get(self.url(&format!("/files/{}/content", id)))
            .header(reqwest::header::AUTHORIZATION, self.auth()?)
            .send()
            .map_err(|e| StoreError::transport(&resource, e))?;
        let bytes = self
            .ensure_ok(resp, &resource)?
            .bytes()
            .map_err(|e| StoreError::transport(&resource, e))?;
        Ok(bytes.to_vec())
    }

    fn create_object(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime: &str,
        folder: &Locator,
    ) -> Result<RemoteFile, StoreError> {
        let resp = self
            .http
            .post(self.url("/files"))
            .query(&[("parent", folder.as_str()), ("name", name)])
            .header(reqwest::header::AUTHORIZATION, self.auth()?)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .map_err(|e| StoreError::transport(name, e))?;
        let meta: RemoteFile = self
            .ensure_ok(resp, name)?
            .json()
            .map_err(|e| StoreError::transport("parse created file", e))?;
        self.remember_name(&meta.id, &meta.name);
        Ok(meta)
    }

    fn share(&self, id: &str) -> Result<(), StoreError> {
        let resource = self.describe(id);
        let resp = self
            .http
            .post(self.url(&format!("/files/{}/permissions", id)))
            .header(reqwest::header::AUTHORIZATION, self.auth()?)
            .json(&PermissionRequest::anyone_reader())
            .send()
            .map_err(|e| StoreError::transport(&resource, e))?;
        let _ = self.ensure_ok(resp, &resource)?;
        Ok(())
    }

    fn update_object(
        &self,
        id: &Locator,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<RemoteFile, StoreError> {
        let resource = self.describe(id.as_str());
        let resp = self
            .http
            .patch(self.url(&format!("/files/{}/content", id)))
            .header(reqwest::header::AUTHORIZATION, self.auth()?)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .map_err(|e| StoreError::transport(&resource, e))?;
        let meta: RemoteFile = self
            .ensure_ok(resp, &resource)?
            .json()
            .map_err(|e| StoreError::transport("parse updated file", e))?;
        self.remember_name(&meta.id, &meta.name);
        Ok(meta)
    }

    fn make_folder(&self, parent: &Locator, name: &str) -> Result<RemoteFile, StoreError> {
        let resp = self
            .http
            .post(self.url("/folders"))
            .header(reqwest::header::AUTHORIZATION, self.auth()?)
            .json(&CreateFolderRequest {
                name: name.to_string(),
                parent: parent.as_str().to_string(),
            })
            .send()
            .map_err(|e| StoreError::transport(name, e))?;
        let meta: RemoteFile = self
            .ensure_ok(resp, name)?
            .json()
            .map_err(|e| StoreError::transport("parse created folder", e))?;
        self.remember_name(&meta.id, &meta.name);
        Ok(meta)
    }
}
