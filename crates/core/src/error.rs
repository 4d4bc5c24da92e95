use snafu::Snafu;

/// Precondition failures of chatroom operations. Display strings are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ChatError {
    #[snafu(display("Please log in to {action}."))]
    NotSignedIn {
        stage: &'static str,
        action: &'static str,
    },
    #[snafu(display("Please select a chatroom to send messages."))]
    NoChatroomSelected { stage: &'static str },
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Form-field validation failures, rendered inline under the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ValidationError {
    #[snafu(display("Country code is required"))]
    MissingCountryCode,
    #[snafu(display("Phone number must be at least 10 digits"))]
    PhoneTooShort,
    #[snafu(display("Phone number too long"))]
    PhoneTooLong,
    #[snafu(display("Invalid phone number"))]
    PhoneNotNumeric,
    #[snafu(display("OTP must be 6 digits"))]
    OtpLength,
    #[snafu(display("Invalid OTP"))]
    OtpNotNumeric,
    #[snafu(display("Title must be at least 3 characters"))]
    TitleTooShort,
    #[snafu(display("Title too long"))]
    TitleTooLong,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DirectoryError {
    #[snafu(display("country directory request to {url} failed"))]
    DirectoryRequest {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("country directory returned an unreadable payload"))]
    DirectoryPayload {
        stage: &'static str,
        source: serde_json::Error,
    },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttachmentError {
    #[snafu(display("failed to read image {path}"))]
    ReadImage {
        stage: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("unsupported image type for {path}"))]
    UnsupportedImage { stage: &'static str, path: String },
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;
