use sanad_derive::Validate;

#[derive(Validate)]
#[validate(non_empty)]
pub struct Sample {
    pub name: String,

    #[validate(skip)]
    pub note: String,

    pub counter: u64,
}

fn main() {
    let s = Sample::new("test".into(), String::new(), 10);
    assert!(s.is_ok());
}
