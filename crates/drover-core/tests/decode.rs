use base64::{engine::general_purpose::STANDARD, Engine as _};
use drover_core::prelude::{DecodeError, Dtype, RequestDecoder, TensorShape};

fn decoder() -> RequestDecoder {
    RequestDecoder::new(TensorShape::new(2, 2, 1), Dtype::F32)
}

fn envelope(id: &str, payload: &str, shape: [usize; 3], dtype: &str) -> Vec<u8> {
    serde_json::json!({
        "id": id,
        "payload": payload,
        "shape": shape,
        "dtype": dtype,
    })
    .to_string()
    .into_bytes()
}

fn f32_payload(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

#[test]
fn decodes_f32_payload() {
    let decoder = decoder();
    let raw = envelope("a", &f32_payload(&[1.0, 2.0, 3.0, 4.0]), [2, 2, 1], "float32");

    let entry = decoder.parse_envelope(&raw).unwrap();
    let unit = decoder.decode(&entry).unwrap();

    assert_eq!(entry.id, "a");
    assert_eq!(unit, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn widens_u8_payload_unscaled() {
    let decoder = RequestDecoder::new(TensorShape::new(2, 2, 1), Dtype::U8);
    let raw = envelope("a", &STANDARD.encode([0u8, 128, 255, 1]), [2, 2, 1], "uint8");

    let entry = decoder.parse_envelope(&raw).unwrap();
    let unit = decoder.decode(&entry).unwrap();

    assert_eq!(unit, vec![0.0, 128.0, 255.0, 1.0]);
}

#[test]
fn rejects_bad_base64() {
    let decoder = decoder();
    let raw = envelope("a", "!!not base64!!", [2, 2, 1], "float32");

    let entry = decoder.parse_envelope(&raw).unwrap();
    let err = decoder.decode(&entry).unwrap_err();

    assert!(matches!(err, DecodeError::Payload(_)), "got {:?}", err);
}

#[test]
fn rejects_declared_shape_mismatch() {
    let decoder = decoder();
    let raw = envelope("a", &f32_payload(&[1.0; 4]), [4, 1, 1], "float32");

    let entry = decoder.parse_envelope(&raw).unwrap();
    let err = decoder.decode(&entry).unwrap_err();

    assert!(
        matches!(
            err,
            DecodeError::ShapeMismatch {
                declared: [4, 1, 1],
                expected: [2, 2, 1]
            }
        ),
        "got {:?}",
        err
    );
}

#[test]
fn rejects_dtype_mismatch() {
    let decoder = decoder();
    let raw = envelope("a", &STANDARD.encode([1u8, 2, 3, 4]), [2, 2, 1], "uint8");

    let entry = decoder.parse_envelope(&raw).unwrap();
    let err = decoder.decode(&entry).unwrap_err();

    assert!(matches!(err, DecodeError::DtypeMismatch { .. }), "got {:?}", err);
}

#[test]
fn rejects_truncated_payload() {
    let decoder = decoder();
    let raw = envelope("a", &f32_payload(&[1.0, 2.0, 3.0]), [2, 2, 1], "float32");

    let entry = decoder.parse_envelope(&raw).unwrap();
    let err = decoder.decode(&entry).unwrap_err();

    assert!(
        matches!(
            err,
            DecodeError::PayloadLength {
                got: 12,
                expected: 16,
                ..
            }
        ),
        "got {:?}",
        err
    );
}

#[test]
fn rejects_unreadable_envelope() {
    let decoder = decoder();
    let err = decoder.parse_envelope(b"not json at all").unwrap_err();

    assert!(matches!(err, DecodeError::Envelope(_)), "got {:?}", err);
}
