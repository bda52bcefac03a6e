pub(crate) const INVOICE_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
pub(crate) const CBC_NS: &str =
    "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
pub(crate) const CAC_NS: &str =
    "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
pub(crate) const EXT_NS: &str =
    "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
pub(crate) const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

pub(crate) const PROFILE_ID: &str = "reporting:1.0";
pub(crate) const DOCUMENT_ELEMENT: &str = "Invoice";

pub(crate) const SIGNED_INFO_TEMPLATE: &str =
    include_str!("../../../assets/templates/signed_info.xml");
pub(crate) const SIGNATURE_TEMPLATE: &str =
    include_str!("../../../assets/templates/signature.xml");
