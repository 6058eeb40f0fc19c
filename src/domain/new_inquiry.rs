use serde::Serialize;

use crate::routes::ContactForm;

use super::{EmailAddress, InquirerName, NameError};

/// Row inserted into the `user_queries` table.
#[derive(Debug, Serialize, Clone)]
pub struct NewInquiry {
    pub name: InquirerName,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub message: String,
}

/// First failing check of a contact form submission.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryValidationError {
    #[error("Please enter your name.")]
    MissingName,
    #[error("Please enter a shorter name.")]
    NameTooLong,
    #[error("Please enter your email address.")]
    MissingEmail,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter a message.")]
    MissingMessage,
}

impl InquiryValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingName | Self::NameTooLong => "name",
            Self::MissingEmail | Self::InvalidEmail => "email",
            Self::MissingMessage => "message",
        }
    }
}

impl TryFrom<ContactForm> for NewInquiry {
    type Error = InquiryValidationError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        let name = InquirerName::parse(&form.name).map_err(|e| match e {
            NameError::Empty => InquiryValidationError::MissingName,
            NameError::TooLong => InquiryValidationError::NameTooLong,
        })?;
        if form.email.trim().is_empty() {
            return Err(InquiryValidationError::MissingEmail);
        }
        let email =
            EmailAddress::parse(form.email).map_err(|_| InquiryValidationError::InvalidEmail)?;
        let message = form.message.trim();
        if message.is_empty() {
            return Err(InquiryValidationError::MissingMessage);
        }
        let phone = form
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Self {
            name,
            email,
            phone,
            message: message.to_string(),
        })
    }
}
