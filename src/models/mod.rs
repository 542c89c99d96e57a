pub mod propertymodel;
pub mod verificationmodels;
