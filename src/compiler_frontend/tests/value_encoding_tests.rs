//! Tests for the value byte encoding.

use super::{
    ByteOrder, ConstantWidth, DecodedValue, EncodingError, KIND_CONSTANT, KIND_VARIABLE,
    decode_value, encode_value, narrowing_changes_value,
};
use crate::compiler_frontend::ast::ast_nodes::Literal;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use crate::compiler_frontend::datatypes::Scalar;
use crate::compiler_frontend::lowering::lowered_ir::ValueRef;
use proptest::prelude::*;

fn constant(literal: Literal) -> ValueRef {
    ValueRef::Constant(literal)
}

#[test]
fn variables_encode_as_kind_zero_with_the_ascii_name() {
    let bytes = encode_value(&ValueRef::Variable(String::from("total")), ConstantWidth::Declared)
        .expect("variable should encode");

    assert_eq!(bytes[0], KIND_VARIABLE);
    assert_eq!(bytes[1], 0);
    assert_eq!(&bytes[2..], b"total");
}

#[test]
fn declared_width_keeps_small_ints_as_int32() {
    let bytes = encode_value(&constant(Literal::Int(3)), ConstantWidth::Declared)
        .expect("constant should encode");

    let mut expected = vec![KIND_CONSTANT, 1];
    expected.extend(3i32.to_ne_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn declared_width_widens_large_ints_and_all_floats() {
    let large = encode_value(&constant(Literal::Int(1 << 40)), ConstantWidth::Declared)
        .expect("constant should encode");
    assert_eq!(large[1], 2);
    assert_eq!(large.len(), 10);

    let float = encode_value(&constant(Literal::Float(0.1)), ConstantWidth::Declared)
        .expect("constant should encode");
    assert_eq!(float[1], 4);
    assert_eq!(
        decode_value(&float),
        Ok(DecodedValue::Constant(Scalar::Float64(0.1)))
    );
}

#[test]
fn narrow_width_truncates_to_four_bytes() {
    let large = encode_value(&constant(Literal::Int((1 << 32) + 5)), ConstantWidth::Narrow)
        .expect("constant should encode");
    assert_eq!(large.len(), 6);
    assert_eq!(decode_value(&large), Ok(DecodedValue::Constant(Scalar::Int32(5))));

    let float = encode_value(&constant(Literal::Float(0.5)), ConstantWidth::Narrow)
        .expect("constant should encode");
    assert_eq!(float[1], 3);
    assert_eq!(decode_value(&float), Ok(DecodedValue::Constant(Scalar::Float32(0.5))));

    assert!(narrowing_changes_value(&Literal::Int(1 << 40)));
    assert!(narrowing_changes_value(&Literal::Float(0.1)));
    assert!(!narrowing_changes_value(&Literal::Float(0.5)));
    assert!(!narrowing_changes_value(&Literal::Int(-7)));
}

#[test]
fn non_numeric_literals_fail_as_encoding_errors() {
    for literal in [
        Literal::Str(String::from("x")),
        Literal::Bool(true),
        Literal::None,
    ] {
        let error = encode_value(&constant(literal), ConstantWidth::Declared)
            .expect_err("non-numeric literal should fail");
        assert!(matches!(error, EncodingError::NonNumericLiteral(_)));

        let compiler_error: CompilerError = error.into();
        assert_eq!(compiler_error.error_type, ErrorType::Encoding);
    }
}

#[test]
fn non_ascii_names_are_rejected() {
    let error = encode_value(&ValueRef::Variable(String::from("größe")), ConstantWidth::Declared)
        .expect_err("non-ASCII name should fail");

    assert!(matches!(error, EncodingError::InvalidName(_)));
}

#[test]
fn decoder_validates_header_and_length() {
    assert!(matches!(
        decode_value(&[KIND_CONSTANT]),
        Err(EncodingError::Truncated { .. })
    ));
    assert_eq!(decode_value(&[7, 1, 0, 0, 0, 0]), Err(EncodingError::UnknownKind(7)));
    assert_eq!(
        decode_value(&[KIND_CONSTANT, 9, 0, 0, 0, 0]),
        Err(EncodingError::UnknownTypeId(9))
    );
    assert!(matches!(
        decode_value(&[KIND_CONSTANT, 2, 0, 0, 0, 0]),
        Err(EncodingError::Truncated { .. })
    ));
    assert_eq!(
        decode_value(&[KIND_VARIABLE, 1, b'x']),
        Err(EncodingError::TypedVariable(1))
    );
    assert!(matches!(
        decode_value(&[KIND_VARIABLE, 0]),
        Err(EncodingError::InvalidName(_))
    ));
}

#[test]
fn native_byte_order_matches_the_target() {
    let order = ByteOrder::native();
    if cfg!(target_endian = "little") {
        assert_eq!(order, ByteOrder::Little);
    } else {
        assert_eq!(order, ByteOrder::Big);
    }
}

proptest! {
    #[test]
    fn declared_constants_decode_exactly(value in any::<i64>()) {
        let bytes = encode_value(&constant(Literal::Int(value)), ConstantWidth::Declared)
            .expect("int should encode");
        let decoded = decode_value(&bytes).expect("int should decode");
        let DecodedValue::Constant(scalar) = decoded else {
            panic!("expected a constant");
        };
        prop_assert_eq!(scalar.as_i64(), value);
    }

    #[test]
    fn declared_floats_decode_exactly(value in any::<f64>().prop_filter("not NaN", |v| !v.is_nan())) {
        let bytes = encode_value(&constant(Literal::Float(value)), ConstantWidth::Declared)
            .expect("float should encode");
        prop_assert_eq!(decode_value(&bytes), Ok(DecodedValue::Constant(Scalar::Float64(value))));
    }

    #[test]
    fn narrow_constants_decode_up_to_truncation(value in any::<i64>()) {
        let bytes = encode_value(&constant(Literal::Int(value)), ConstantWidth::Narrow)
            .expect("int should encode");
        prop_assert_eq!(decode_value(&bytes), Ok(DecodedValue::Constant(Scalar::Int32(value as i32))));
    }

    #[test]
    fn ascii_names_decode_exactly(name in "[a-zA-Z_][a-zA-Z0-9_]{0,16}") {
        let bytes = encode_value(&ValueRef::Variable(name.clone()), ConstantWidth::Declared)
            .expect("name should encode");
        prop_assert_eq!(decode_value(&bytes), Ok(DecodedValue::Variable(name)));
    }
}
