use sanad_derive::Validate;

#[derive(Validate)]
pub struct Subject {
    #[validate(non_empty)]
    pub name: String,
    #[validate(is_country_code)]
    pub country: String,
}

fn main() {
    let s = Subject::new("Sanad Test Supply".into(), "SA".into());
    assert!(s.is_ok());
}
