//! Data for tests.

pub const TEST_UNSIGNED_CREDENTIAL: &str = r##"{
    "@context": [
        "https://www.w3.org/2018/credentials/v1",
        "https://www.w3.org/2018/credentials/examples/v1"
    ],
    "id": "https://credchain.example/credentials/1872",
    "type": ["VerifiableCredential", "AlumniCredential"],
    "issuanceDate": "2023-03-28T10:12:09Z",
    "credentialSubject": {
        "id": "did:credchain:subject",
        "emailAddress": "jane@example.com",
        "alumniOf": "Example University"
    }
}"##;

pub const TEST_DID_DOCUMENT: &str = r##"{
    "id": "did:credchain:issuer",
    "publicKey": [
        {
            "id": "did:credchain:issuer#keys-1",
            "type": "Ed25519VerificationKey2018",
            "controller": "did:credchain:issuer",
            "publicKeyHex": "4f2f6c7e3a1b0d9c8e5a41223344556677889900aabbccddeeff001122334455"
        }
    ],
    "authentication": ["did:credchain:issuer#keys-1"]
}"##;

/// Schema for the alumni contact credential. The `alumniOf` property points
/// at another ledger schema through the hyphenated `$ref` spelling.
pub const TEST_EMAIL_SCHEMA: &str = r##"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$id": "schema:credchain:Gx8k72qM",
    "description": "Alumni contact record",
    "type": "object",
    "properties": {
        "emailAddress": {
            "type": "string",
            "format": "email"
        },
        "alumniOf": {
            "$ref": "schema-credchain-9uOrgName"
        }
    },
    "required": ["emailAddress"],
    "additionalProperties": true
}"##;

pub const TEST_ORG_NAME_SCHEMA: &str = r##"{
    "$id": "schema:credchain:9uOrgName",
    "type": "string",
    "minLength": 1
}"##;

pub const TEST_SCHEMA_WITH_REF: &str = r##"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$id": "schema:credchain:EmailRoot",
    "type": "object",
    "properties": {
        "email": {
            "$ref": "schema-credchain-9uEmailPart"
        },
        "label": {
            "$ref": "#/definitions/label"
        }
    },
    "definitions": {
        "label": {
            "type": "string"
        }
    }
}"##;

pub const TEST_ISSUER_ED25519_SEED: &str =
    "1c62f994b9b98d1d93aa5406711d07c5bbbd4b403b42dcb1e067678bdeac1eec";
pub const TEST_ISSUER_SR25519_SEED: &str =
    "4d9c8350b3822ae4ca54ee5c8b0a11c0d38db7e4b1a564b6b4e2edd5a9702f6e";
pub const TEST_ISSUER_SECP256K1_SECRET: &str =
    "3fb5c1a0468f7e9d2b6c08a11f4e73925dd0648be4a39cf167024e5c39707d18";
pub const TEST_HOLDER_ED25519_SEED: &str =
    "7a0e42c5d91f6b38807c25ae1e79cd4ff26b39d0e8541fa6b2c0d9183e5a7c44";

#[cfg(test)]
pub(crate) fn test_issuer_key() -> crate::key::KeyDescriptor {
    crate::key::KeyDescriptor::from_secret(
        "did:credchain:issuer#keys-1",
        "did:credchain:issuer",
        crate::key::Algorithm::Ed25519,
        &hex::decode(TEST_ISSUER_ED25519_SEED).unwrap(),
    )
    .unwrap()
}

#[cfg(test)]
pub(crate) fn test_sr25519_issuer_key() -> crate::key::KeyDescriptor {
    crate::key::KeyDescriptor::from_secret(
        "did:credchain:issuer-sr#keys-1",
        "did:credchain:issuer-sr",
        crate::key::Algorithm::Sr25519,
        &hex::decode(TEST_ISSUER_SR25519_SEED).unwrap(),
    )
    .unwrap()
}

#[cfg(test)]
pub(crate) fn test_secp256k1_issuer_key() -> crate::key::KeyDescriptor {
    crate::key::KeyDescriptor::from_secret(
        "did:credchain:issuer-ec#keys-1",
        "did:credchain:issuer-ec",
        crate::key::Algorithm::EcdsaSecp256k1,
        &hex::decode(TEST_ISSUER_SECP256K1_SECRET).unwrap(),
    )
    .unwrap()
}

#[cfg(test)]
pub(crate) fn test_holder_key() -> crate::key::KeyDescriptor {
    crate::key::KeyDescriptor::from_secret(
        "did:credchain:holder#keys-1",
        "did:credchain:holder",
        crate::key::Algorithm::Ed25519,
        &hex::decode(TEST_HOLDER_ED25519_SEED).unwrap(),
    )
    .unwrap()
}
