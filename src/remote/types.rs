//! DTOs for remote file-store requests/responses.

/// Metadata record of one remote object, folder or file.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, serde::Serialize)]
pub(super) struct CreateFolderRequest {
    pub(super) name: String,
    pub(super) parent: String,
}

/// Fixed post-upload sharing policy: anyone with the link may read, and the
/// object is discoverable.
#[derive(Debug, serde::Serialize)]
pub(super) struct PermissionRequest {
    #[serde(rename = "type")]
    pub(super) grantee: &'static str,
    pub(super) role: &'static str,
    pub(super) allow_discovery: bool,
}

impl PermissionRequest {
    pub(super) fn anyone_reader() -> Self {
        Self {
            grantee: "anyone",
            role: "reader",
            allow_discovery: true,
        }
    }
}
