use sanad_derive::Validate;

#[derive(Debug)]
pub struct SubjectError(String);

impl From<String> for SubjectError {
    fn from(message: String) -> Self {
        SubjectError(message)
    }
}

#[derive(Debug, Validate)]
#[validate_error(SubjectError)]
#[validate(non_empty, printable_string)]
pub struct Subject {
    pub common_name: String,
    #[validate(is_country_code)]
    pub country_name: String,
}

fn main() {
    let err = Subject::new("   ".into(), "SA".into()).unwrap_err();
    assert!(err.0.contains("common_name must be non-empty"));

    let err = Subject::new("ACME & Sons".into(), "SA".into()).unwrap_err();
    assert!(err.0.contains("PrintableString"));

    let err = Subject::new("ACME".into(), "sau".into()).unwrap_err();
    assert!(err.0.contains("country_name"));

    assert!(Subject::new("ACME".into(), "SA".into()).is_ok());
}
