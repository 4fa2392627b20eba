use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::backend::upload::{FileSelection, UploadError, UploadPolicy};
use crate::config::UploadConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    /// `data:` URL of the profile photo.
    pub image: Option<String>,
}

pub struct ProfileState {
    profile: Profile,
    policy: UploadPolicy,
}

impl ProfileState {
    pub fn new(limits: &UploadConfig) -> Self {
        Self { profile: Profile::default(), policy: UploadPolicy::profile_photo(limits) }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Rejected photos leave the current image untouched.
    pub fn set_photo(&mut self, file: &FileSelection) -> Result<&Profile, UploadError> {
        self.policy.validate(file)?;
        self.profile.image = Some(data_url(&file.mime_type, &file.bytes));
        tracing::info!(name = %file.name, size = file.size(), "profile photo updated");
        Ok(&self.profile)
    }

    pub fn update_details(&mut self, name: String, email: String, wallet: Option<&str>) -> &Profile {
        tracing::info!(%name, %email, wallet = wallet.unwrap_or("-"), "profile details updated");
        self.profile.name = name;
        self.profile.email = email;
        &self.profile
    }
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
