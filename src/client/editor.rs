//! The profile edit form.
//!
//! Form: `Idle -> Editing -> Submitting -> Closed`, falling back to
//! `Editing` when a submission fails.
//!
//! Upload: `Idle -> Selecting -> Uploading -> Uploaded | Failed`. A rejected
//! file or a failed upload restores the preview shown before the selection.

use super::controller::UserController;
use super::error::{ClientError, FieldError};
use super::form::ProfileForm;
use super::upload::{ImageUploader, SelectedImage};
use crate::handlers::user::UserResponse;
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Editing,
    Submitting,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Selecting,
    Uploading,
    Uploaded,
    Failed,
}

/// Viewer-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

pub type OnUpdate = Box<dyn FnMut(UserResponse) + Send>;

/// An upload handed out by [`ProfileEditor::begin_image_upload`]. It owns
/// everything the request needs, so the editor stays free for other edits
/// while it runs.
pub struct UploadTicket {
    uploader: Arc<dyn ImageUploader>,
    image: SelectedImage,
    user_id: i32,
    username: String,
}

impl UploadTicket {
    pub async fn send(self) -> Result<String, ClientError> {
        self.uploader
            .upload(&self.image, self.user_id, &self.username)
            .await
    }
}

pub struct ProfileEditor {
    controller: Arc<dyn UserController>,
    uploader: Arc<dyn ImageUploader>,
    on_update: OnUpdate,
    user: Option<UserResponse>,
    form: ProfileForm,
    status: FormStatus,
    upload: UploadState,
    /// Last picture that is not a local preview: the persisted one or an
    /// uploaded URL.
    settled_picture: Option<String>,
    preview: Option<String>,
    pending: Option<SelectedImage>,
    field_errors: Vec<FieldError>,
    notices: Vec<Notice>,
}

impl ProfileEditor {
    pub fn new(
        controller: Arc<dyn UserController>,
        uploader: Arc<dyn ImageUploader>,
        on_update: impl FnMut(UserResponse) + Send + 'static,
    ) -> Self {
        Self {
            controller,
            uploader,
            on_update: Box::new(on_update),
            user: None,
            form: ProfileForm::default(),
            status: FormStatus::Idle,
            upload: UploadState::Idle,
            settled_picture: None,
            preview: None,
            pending: None,
            field_errors: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Load the user into the form and start editing. `None` opens an
    /// empty form that can be edited but not submitted.
    pub fn open(&mut self, user: Option<UserResponse>) {
        self.form = user.as_ref().map(ProfileForm::from_user).unwrap_or_default();
        self.settled_picture = user
            .as_ref()
            .and_then(|u| u.profile.as_ref())
            .and_then(|p| p.profile_picture.clone());
        self.preview = self.settled_picture.clone();
        self.user = user;
        self.pending = None;
        self.upload = UploadState::Idle;
        self.field_errors.clear();
        self.notices.clear();
        self.status = FormStatus::Editing;
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn user(&self) -> Option<&UserResponse> {
        self.user.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn pending_image(&self) -> Option<&SelectedImage> {
        self.pending.as_ref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Change form values. Ignored unless the form is being edited.
    pub fn edit(&mut self, change: impl FnOnce(&mut ProfileForm)) -> bool {
        if self.status != FormStatus::Editing {
            return false;
        }
        change(&mut self.form);
        true
    }

    pub fn select_birthdate(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        self.status == FormStatus::Editing && self.form.select_birthdate(date, today)
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        self.notices.push(Notice::Error(error.to_string()));
        error
    }

    fn identity(&self) -> Option<(i32, String)> {
        self.user.as_ref().map(|u| (u.id, u.username.clone()))
    }

    /// Take a picked file: run the local checks and show a local preview.
    pub fn select_image(&mut self, image: SelectedImage) -> Result<(), ClientError> {
        if self.upload == UploadState::Uploading {
            return Err(self.fail(ClientError::UploadPending));
        }
        self.upload = UploadState::Selecting;

        let checked = match self.identity() {
            None => Err(ClientError::MissingUser),
            Some(_) => image.check(),
        };
        if let Err(e) = checked {
            self.revert_selection();
            return Err(self.fail(e));
        }

        self.preview = Some(image.preview_url());
        self.pending = Some(image);
        Ok(())
    }

    fn revert_selection(&mut self) {
        self.pending = None;
        self.preview = self.settled_picture.clone();
        self.upload = UploadState::Failed;
    }

    /// Move the selected image to `Uploading` and hand back the request.
    pub fn begin_image_upload(&mut self) -> Result<UploadTicket, ClientError> {
        if self.upload == UploadState::Uploading {
            return Err(self.fail(ClientError::UploadPending));
        }
        let Some((user_id, username)) = self.identity() else {
            return Err(self.fail(ClientError::MissingUser));
        };
        let Some(image) = self.pending.clone() else {
            return Err(self.fail(ClientError::NoImageSelected));
        };

        self.upload = UploadState::Uploading;
        Ok(UploadTicket {
            uploader: Arc::clone(&self.uploader),
            image,
            user_id,
            username,
        })
    }

    /// Settle an upload. A failure is also returned to the caller.
    pub fn finish_image_upload(
        &mut self,
        result: Result<String, ClientError>,
    ) -> Result<(), ClientError> {
        match result {
            Ok(url) => {
                tracing::debug!(%url, "profile image uploaded");
                self.pending = None;
                self.settled_picture = Some(url.clone());
                self.preview = Some(url);
                self.upload = UploadState::Uploaded;
                self.notices
                    .push(Notice::Success("Image uploaded".to_string()));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile image upload failed");
                self.revert_selection();
                self.notices
                    .push(Notice::Error(format!("Image upload failed: {e}")));
                Err(e)
            }
        }
    }

    /// Select, upload and settle in one call.
    pub async fn upload_image(&mut self, image: SelectedImage) -> Result<(), ClientError> {
        self.select_image(image)?;
        let ticket = self.begin_image_upload()?;
        let result = ticket.send().await;
        self.finish_image_upload(result)
    }


    pub async fn submit(&mut self) -> Result<UserResponse, ClientError> {
        if self.status != FormStatus::Editing {
            return Err(self.fail(ClientError::NotEditing));
        }
        if self.upload == UploadState::Uploading {
            return Err(self.fail(ClientError::UploadPending));
        }
        let Some((user_id, _)) = self.identity() else {
            return Err(self.fail(ClientError::MissingUser));
        };

        if let Err(errors) = self.form.check() {
            self.field_errors = errors.clone();
            return Err(ClientError::Validation(errors));
        }
        self.field_errors.clear();

        let payload = self.form.to_payload(self.settled_picture.clone());
        self.status = FormStatus::Submitting;

        match self.controller.update_profile(user_id, &payload).await {
            Ok(updated) => {
                (self.on_update)(updated.clone());
                self.settled_picture = updated
                    .profile
                    .as_ref()
                    .and_then(|p| p.profile_picture.clone());
                self.user = Some(updated.clone());
                self.status = FormStatus::Closed;
                self.notices
                    .push(Notice::Success("Profile updated".to_string()));
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "profile update failed");
                self.status = FormStatus::Editing;
                self.notices
                    .push(Notice::Error("Failed to update profile".to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::user::ProfileResponse;
    use crate::client::upload::is_local_preview;
    use crate::services::profile::UpdateProfileRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeController {
        calls: Mutex<Vec<(i32, UpdateProfileRequest)>>,
        fail: bool,
    }

    #[async_trait]
    impl UserController for FakeController {
        async fn update_profile(
            &self,
            user_id: i32,
            data: &UpdateProfileRequest,
        ) -> Result<UserResponse, ClientError> {
            self.calls.lock().unwrap().push((user_id, data.clone()));
            if self.fail {
                return Err(ClientError::EmptyResponse);
            }
            let profile = data.profile.clone().unwrap_or_default();
            Ok(UserResponse {
                username: data.username.clone().unwrap_or_default(),
                profile: Some(ProfileResponse {
                    bio: profile.bio.flatten(),
                    website: profile.website.flatten(),
                    birthdate: None,
                    profile_picture: profile.profile_picture.flatten(),
                }),
                ..alice()
            })
        }
    }

    struct FakeUploader {
        calls: AtomicUsize,
        result: Result<String, u16>,
    }

    impl FakeUploader {
        fn returning(url: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(url.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(500),
            }
        }
    }

    #[async_trait]
    impl ImageUploader for FakeUploader {
        async fn upload(
            &self,
            _image: &SelectedImage,
            _user_id: i32,
            _username: &str,
        ) -> Result<String, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(|status| ClientError::Server {
                status,
                message: "boom".into(),
            })
        }
    }

    fn alice() -> UserResponse {
        UserResponse {
            id: 7,
            username: "alice".into(),
            email: Some("alice@example.com".into()),
            verified: true,
            first_name: None,
            last_name: None,
            location: None,
            about: None,
            created_at: "2026-01-01T00:00:00+00:00".into(),
            profile: Some(ProfileResponse {
                bio: None,
                website: None,
                birthdate: None,
                profile_picture: Some("/uploads/profiles/old.png".into()),
            }),
        }
    }

    fn png(len: usize) -> SelectedImage {
        SelectedImage::new("me.png", "image/png", vec![0u8; len])
    }

    struct Harness {
        editor: ProfileEditor,
        controller: Arc<FakeController>,
        uploader: Arc<FakeUploader>,
        updates: Arc<Mutex<Vec<UserResponse>>>,
    }

    fn harness(controller: FakeController, uploader: FakeUploader) -> Harness {
        let controller = Arc::new(controller);
        let uploader = Arc::new(uploader);
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        let mut editor = ProfileEditor::new(
            controller.clone(),
            uploader.clone(),
            move |user| sink.lock().unwrap().push(user),
        );
        editor.open(Some(alice()));
        Harness {
            editor,
            controller,
            uploader,
            updates,
        }
    }

    #[test]
    fn open_starts_editing_with_persisted_preview() {
        let h = harness(FakeController::default(), FakeUploader::failing());
        assert_eq!(h.editor.status(), FormStatus::Editing);
        assert_eq!(h.editor.upload_state(), UploadState::Idle);
        assert_eq!(h.editor.preview(), Some("/uploads/profiles/old.png"));
        assert_eq!(h.editor.form().username, "alice");
    }

    #[tokio::test]
    async fn oversized_image_never_reaches_the_network() {
        let mut h = harness(FakeController::default(), FakeUploader::returning("x"));
        let err = h.editor.upload_image(png(5 * 1024 * 1024 + 1)).await.unwrap_err();
        assert!(matches!(err, ClientError::FileTooLarge));
        assert_eq!(h.uploader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.editor.preview(), Some("/uploads/profiles/old.png"));
        assert!(matches!(h.editor.notices().last(), Some(Notice::Error(_))));
    }

    #[tokio::test]
    async fn non_image_never_reaches_the_network() {
        let mut h = harness(FakeController::default(), FakeUploader::returning("x"));
        let err = h
            .editor
            .upload_image(SelectedImage::new("a.txt", "text/plain", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedFileType));
        assert_eq!(h.uploader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn selecting_without_a_user_is_a_notice() {
        let mut editor = ProfileEditor::new(
            Arc::new(FakeController::default()),
            Arc::new(FakeUploader::returning("x")),
            |_| {},
        );
        editor.open(None);
        assert!(matches!(
            editor.select_image(png(8)),
            Err(ClientError::MissingUser)
        ));
        assert_eq!(editor.notices().len(), 1);
        assert!(editor.pending_image().is_none());
    }

    #[tokio::test]
    async fn successful_upload_shows_server_url() {
        let mut h = harness(
            FakeController::default(),
            FakeUploader::returning("https://x/img.png"),
        );
        h.editor.upload_image(png(64)).await.unwrap();
        assert_eq!(h.editor.preview(), Some("https://x/img.png"));
        assert_eq!(h.editor.upload_state(), UploadState::Uploaded);
        assert!(h.editor.pending_image().is_none());
        assert_eq!(
            h.editor.take_notices(),
            vec![Notice::Success("Image uploaded".to_string())]
        );
        assert!(h.editor.notices().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_reverts_preview() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        assert!(h.editor.upload_image(png(64)).await.is_err());
        assert_eq!(h.editor.preview(), Some("/uploads/profiles/old.png"));
        assert_eq!(h.editor.upload_state(), UploadState::Failed);
        assert!(h.editor.pending_image().is_none());
        assert!(matches!(h.editor.notices().last(), Some(Notice::Error(_))));
    }

    #[tokio::test]
    async fn failed_upload_keeps_an_earlier_unsaved_upload() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        h.editor.select_image(png(64)).unwrap();
        h.editor.begin_image_upload().unwrap();
        h.editor
            .finish_image_upload(Ok("https://x/first.png".to_string()))
            .unwrap();

        assert!(h.editor.upload_image(png(64)).await.is_err());
        assert_eq!(h.editor.preview(), Some("https://x/first.png"));

        h.editor.submit().await.unwrap();
        let calls = h.controller.calls.lock().unwrap();
        let profile = calls[0].1.profile.clone().unwrap();
        assert_eq!(
            profile.profile_picture,
            Some(Some("https://x/first.png".to_string()))
        );
    }

    #[test]
    fn rejected_file_drops_the_earlier_selection() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        h.editor.select_image(png(64)).unwrap();
        assert!(h.editor.preview().is_some_and(is_local_preview));

        assert!(h.editor.select_image(png(5 * 1024 * 1024 + 1)).is_err());
        assert!(h.editor.pending_image().is_none());
        assert_eq!(h.editor.preview(), Some("/uploads/profiles/old.png"));
        assert_eq!(h.editor.upload_state(), UploadState::Failed);
        assert!(matches!(
            h.editor.begin_image_upload(),
            Err(ClientError::NoImageSelected)
        ));
    }

    #[tokio::test]
    async fn local_preview_shows_while_uploading_and_edits_continue() {
        let mut h = harness(
            FakeController::default(),
            FakeUploader::returning("/uploads/profiles/new.png"),
        );
        h.editor.select_image(png(64)).unwrap();
        assert!(h.editor.preview().is_some_and(is_local_preview));

        let ticket = h.editor.begin_image_upload().unwrap();
        assert_eq!(h.editor.upload_state(), UploadState::Uploading);
        assert!(h.editor.edit(|f| f.bio = "typing meanwhile".into()));

        assert!(matches!(
            h.editor.submit().await,
            Err(ClientError::UploadPending)
        ));
        assert!(h.controller.calls.lock().unwrap().is_empty());

        let result = ticket.send().await;
        h.editor.finish_image_upload(result).unwrap();
        assert_eq!(h.editor.preview(), Some("/uploads/profiles/new.png"));
    }

    #[tokio::test]
    async fn submit_sends_partial_payload_and_closes() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        h.editor.edit(|f| {
            f.username = "alice123".into();
            f.bio = "hi".into();
            f.website = String::new();
        });

        let updated = h.editor.submit().await.unwrap();
        assert_eq!(updated.username, "alice123");
        assert_eq!(h.editor.status(), FormStatus::Closed);

        let calls = h.controller.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (user_id, payload) = &calls[0];
        assert_eq!(*user_id, 7);
        let body = serde_json::to_value(payload).unwrap();
        assert_eq!(body["username"], "alice123");
        assert_eq!(body["profile"]["bio"], "hi");
        assert!(body["profile"]["website"].is_null());
        assert_eq!(
            body["profile"]["profile_picture"],
            "/uploads/profiles/old.png"
        );

        assert_eq!(h.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn uploaded_url_is_submitted_as_picture() {
        let mut h = harness(
            FakeController::default(),
            FakeUploader::returning("/uploads/profiles/new.png"),
        );
        h.editor.upload_image(png(64)).await.unwrap();
        h.editor.edit(|f| f.location = "Porto".into());
        h.editor.submit().await.unwrap();

        let calls = h.controller.calls.lock().unwrap();
        let profile = calls[0].1.profile.clone().unwrap();
        assert_eq!(
            profile.profile_picture,
            Some(Some("/uploads/profiles/new.png".to_string()))
        );
    }

    #[tokio::test]
    async fn invalid_fields_keep_the_form_open() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        h.editor.edit(|f| {
            f.username = "al".into();
            f.website = "not-a-url".into();
        });

        let err = h.editor.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref list) if list.len() == 2));
        assert_eq!(h.editor.status(), FormStatus::Editing);
        let fields: Vec<&str> = h
            .editor
            .field_errors()
            .iter()
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(fields, vec!["username", "website"]);
        assert!(h.controller.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn padded_short_username_is_blocked_before_sending() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        h.editor.edit(|f| f.username = "  ab  ".into());

        let err = h.editor.submit().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ref list) if list[0].field == "username"
        ));
        assert_eq!(h.editor.status(), FormStatus::Editing);
        assert!(h.controller.calls.lock().unwrap().is_empty());

        h.editor.edit(|f| f.username = format!("{} ", "a".repeat(30)));
        h.editor.submit().await.unwrap();
        let calls = h.controller.calls.lock().unwrap();
        assert_eq!(calls[0].1.username.as_deref(), Some("a".repeat(30).as_str()));
    }

    #[tokio::test]
    async fn failed_submit_keeps_values() {
        let controller = FakeController {
            fail: true,
            ..Default::default()
        };
        let mut h = harness(controller, FakeUploader::failing());
        h.editor.edit(|f| f.bio = "draft".into());

        assert!(h.editor.submit().await.is_err());
        assert_eq!(h.editor.status(), FormStatus::Editing);
        assert_eq!(h.editor.form().bio, "draft");
        assert!(h.updates.lock().unwrap().is_empty());
        assert_eq!(
            h.editor.notices().last(),
            Some(&Notice::Error("Failed to update profile".to_string()))
        );
    }

    #[tokio::test]
    async fn submit_without_user_fails_immediately() {
        let controller = Arc::new(FakeController::default());
        let mut editor = ProfileEditor::new(
            controller.clone(),
            Arc::new(FakeUploader::failing()),
            |_| {},
        );
        editor.open(None);
        editor.edit(|f| f.username = "alice".into());

        assert!(matches!(
            editor.submit().await,
            Err(ClientError::MissingUser)
        ));
        assert!(controller.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_form_refuses_edits_and_resubmits() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        h.editor.submit().await.unwrap();
        assert_eq!(h.editor.status(), FormStatus::Closed);

        assert!(!h.editor.edit(|f| f.bio = "late".into()));
        assert!(matches!(
            h.editor.submit().await,
            Err(ClientError::NotEditing)
        ));
        assert_eq!(h.updates.lock().unwrap().len(), 1);
    }

    #[test]
    fn future_birthdate_is_not_offered() {
        let mut h = harness(FakeController::default(), FakeUploader::failing());
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(!h.editor.select_birthdate(today.succ_opt().unwrap(), today));
        assert!(h.editor.select_birthdate(today, today));
    }
}
