use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::config::{AppConfig, OBJECT_PREFIX};
use crate::error::{Result, VisitorError};
use crate::record::NewVisitor;
use crate::store::VisitorStore;

/// Photo picked in the registration form. The original file name is only
/// used for its extension; the stored object is named by upload time.
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The public registration form as submitted. Field names mirror the form
/// inputs, not the DB columns; [`upload_visitor_data`] does the mapping.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub photo: Option<Photo>,
    pub full_name: String,
    pub primary_phone: String,
    pub secondary_phone: String,
    pub address: String,
    pub gender: String,
    pub age: String,
    pub visitation_date: String,
    pub inviter_name: String,
    pub inviter_phone: String,
    pub follow_up_leader: String,
    pub foundation_status: String,
    pub foundation_teacher: String,
    pub ministers_status: String,
    pub ministers_teacher: String,
    pub ministry_joined: String,
    pub cell_group_status: String,
    pub assigned_cell_group: String,
}

impl RegistrationForm {
    /// Required text fields in the order they are validated and reported.
    /// Everything except the secondary phone is required.
    fn required_text_fields(&self) -> [(&'static str, &str); 16] {
        [
            ("fullName", self.full_name.as_str()),
            ("primaryPhone", self.primary_phone.as_str()),
            ("address", self.address.as_str()),
            ("gender", self.gender.as_str()),
            ("age", self.age.as_str()),
            ("visitationDate", self.visitation_date.as_str()),
            ("inviterName", self.inviter_name.as_str()),
            ("inviterPhone", self.inviter_phone.as_str()),
            ("followUpLeader", self.follow_up_leader.as_str()),
            ("foundationStatus", self.foundation_status.as_str()),
            ("foundationTeacher", self.foundation_teacher.as_str()),
            ("ministersStatus", self.ministers_status.as_str()),
            ("ministersTeacher", self.ministers_teacher.as_str()),
            ("ministryJoined", self.ministry_joined.as_str()),
            ("cellGroupStatus", self.cell_group_status.as_str()),
            ("assignedCellGroup", self.assigned_cell_group.as_str()),
        ]
    }
}

/// Gate in front of the public form: the shared access secret, separate
/// from the admin one.
pub fn check_access(config: &AppConfig, password: &str) -> Result<()> {
    if config.access_secret.verify(password) {
        Ok(())
    } else {
        Err(VisitorError::Credential)
    }
}

/// Registration path: validate, upload the photo, resolve its public URL,
/// insert the row. Strictly sequential because each step feeds the next;
/// a validation failure aborts before any network call, an upload failure
/// aborts before any insert.
pub async fn upload_visitor_data<S: VisitorStore>(
    store: &S,
    config: &AppConfig,
    form: &RegistrationForm,
) -> Result<()> {
    let photo = match &form.photo {
        Some(photo) if !photo.bytes.is_empty() => photo,
        _ => return Err(VisitorError::MissingField("photo")),
    };
    for (name, value) in form.required_text_fields() {
        if value.trim().is_empty() {
            return Err(VisitorError::MissingField(name));
        }
    }

    let path = format!("{OBJECT_PREFIX}/{}", object_name(photo.file_name.as_str()));
    store
        .upload_object(config.bucket.as_str(), path.as_str(), photo.bytes.clone())
        .await?;
    let image_url = store.public_url(config.bucket.as_str(), path.as_str());

    let record = NewVisitor {
        image: image_url,
        full_name: form.full_name.clone(),
        primary_phone_num: form.primary_phone.clone(),
        secondary_phone_num: nonempty(form.secondary_phone.as_str()),
        address: form.address.clone(),
        gender: form.gender.clone(),
        age: form.age.clone(),
        born_again_date: form.visitation_date.clone(),
        iow_name: form.inviter_name.clone(),
        iow_phone_num: form.inviter_phone.clone(),
        follow_up_leader: form.follow_up_leader.clone(),
        foundation_class_status: form.foundation_status.clone(),
        foundation_class_teacher: form.foundation_teacher.clone(),
        ministers_training_status: form.ministers_status.clone(),
        ministers_training_teacher: form.ministers_teacher.clone(),
        ministry_joined: form.ministry_joined.clone(),
        cell_group_status: form.cell_group_status.clone(),
        assigned_cell_group: form.assigned_cell_group.clone(),
    };
    store.insert(&record).await.map_err(|err| match err {
        VisitorError::Store(message) => {
            VisitorError::Store(format!("Data insert failed: {message}"))
        }
        other => other,
    })?;

    info!(path = path.as_str(), "registered new visitor");
    Ok(())
}

fn nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// `{millis}.{ext}`, extension taken from the uploaded file name.
fn object_name(file_name: &str) -> String {
    let ext = file_name.rsplit('.').next().unwrap_or(file_name);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    format!("{millis}.{ext}")
}
