use sanad_derive::Validate;

#[derive(Validate)]
#[validate(non_empty, printable_string)]
pub struct Csr {
    pub common_name: String,
    pub organization_unit_name: String,
}

fn main() {
    let c = Csr::new("TST-886431145-399999999900003".into(), "Riyadh Branch".into());
    assert!(c.is_ok());
}
