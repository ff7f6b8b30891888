//! [`MediaUploader`] implementation for the render pipeline.

use mdwx_renderer::{MediaUploader, UploadError};

use crate::client::WeChatClient;

impl MediaUploader for WeChatClient {
    fn upload_image(&self, source: &str) -> Result<String, UploadError> {
        WeChatClient::upload_image(self, source)
            .map_err(|err| UploadError::new(source, err.to_string()))
    }

    fn upload_material(&self, source: &str, name: &str) -> Result<String, UploadError> {
        WeChatClient::upload_material(self, source, name)
            .map_err(|err| UploadError::new(source, err.to_string()))
    }
}
