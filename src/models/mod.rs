pub mod chatmodels;
pub mod gigmodel;
pub mod jobmodel;
pub mod ordermodel;
pub mod registrationmodel;
pub mod usermodel;
