mod email_address;
mod inquirer_name;
mod new_inquiry;
mod new_subscriber;

pub use email_address::EmailAddress;
pub use inquirer_name::{InquirerName, NameError};
pub use new_inquiry::{InquiryValidationError, NewInquiry};
pub use new_subscriber::{NewSubscriber, SubscriberStatus};
