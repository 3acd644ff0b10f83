//! Value algebra scenarios
//!
//! End-to-end checks of the arithmetic, string, datetime and interval
//! algorithms through the public type contract.

use pretty_assertions::assert_eq;
use quartzdb_types::{datetime, interval};
use quartzdb_types::*;
use rstest::rstest;
use rust_decimal::Decimal;

fn registry() -> TypeRegistry {
    TypeRegistry::new()
}

fn ctx() -> FixedOffsetSession {
    FixedOffsetSession::utc()
}

fn timestamp(registry: &TypeRegistry, literal: &str) -> SqlValue {
    let t = registry.get_type(TypeKind::Timestamp, 0, 0).unwrap();
    t.convert_to_default_type(&ctx(), &SqlValue::String(literal.into()))
        .unwrap()
}

// === Numeric arithmetic ===

#[test]
fn multiply_combined_type_grows_precision_and_scale() {
    let registry = registry();
    let a = registry.get_type(TypeKind::Numeric, 5, 2).unwrap();
    let b = registry.get_type(TypeKind::Numeric, 3, 1).unwrap();
    let combined = a.combined_type(&b, OpCode::Multiply).unwrap();
    assert_eq!(combined.definition(), "NUMERIC(11,3)");
    assert_eq!(combined.scale(), 3);
}

#[test]
fn integer_add_widens_by_summed_width() {
    let registry = registry();
    let smallint = registry.get_type(TypeKind::Smallint, 0, 0).unwrap();
    let integer = registry.get_type(TypeKind::Integer, 0, 0).unwrap();
    let bigint = registry.get_type(TypeKind::Bigint, 0, 0).unwrap();

    // 16 + 16 = 32 fits INTEGER; 32 + 32 = 64 fits BIGINT; over 64 is NUMERIC
    assert_eq!(
        smallint.combined_type(&smallint, OpCode::Add).unwrap().kind(),
        TypeKind::Integer
    );
    assert_eq!(
        integer.combined_type(&integer, OpCode::Add).unwrap().kind(),
        TypeKind::Bigint
    );
    assert_eq!(
        bigint.combined_type(&bigint, OpCode::Add).unwrap().kind(),
        TypeKind::Numeric
    );
}

#[test]
fn division_by_zero_integer_fails_decimal_yields_null() {
    let registry = registry();
    let ctx = ctx();
    let integer = registry.get_type(TypeKind::Integer, 0, 0).unwrap();
    let decimal = registry.get_type(TypeKind::Numeric, 10, 2).unwrap();

    assert!(matches!(
        integer.binary_op(&ctx, &SqlValue::Integer(1), &SqlValue::Integer(0), OpCode::Divide),
        Err(SqlError::DivisionByZero)
    ));
    assert_eq!(
        decimal
            .binary_op(
                &ctx,
                &SqlValue::Numeric(Decimal::ONE),
                &SqlValue::Numeric(Decimal::ZERO),
                OpCode::Divide,
            )
            .unwrap(),
        SqlValue::Null
    );
}

// === Character operators ===

#[rstest]
#[case(0, 5, true, "hello")]
#[case(1, 3, true, "ell")]
#[case(10, 2, true, "")]
#[case(-2, 4, true, "he")]
#[case(2, 0, false, "llo")]
fn substring_clamps(
    #[case] offset: i64,
    #[case] length: i64,
    #[case] has_length: bool,
    #[case] expected: &str,
) {
    assert_eq!(
        character::substring("hello", offset, length, has_length).unwrap(),
        expected
    );
}

#[test]
fn substring_end_before_offset_fails() {
    assert!(matches!(
        character::substring("hello", 3, -1, true),
        Err(SqlError::SubstringError { .. })
    ));
}

#[test]
fn concat_result_type_and_value() {
    let registry = registry();
    let ctx = ctx();
    let a = registry.get_type(TypeKind::Varchar, 5, 0).unwrap();
    let b = registry.get_type(TypeKind::Varchar, 7, 0).unwrap();
    let combined = a.combined_type(&b, OpCode::Concat).unwrap();
    assert_eq!(combined.kind(), TypeKind::Varchar);
    assert_eq!(combined.precision(), 12);
    assert_eq!(
        combined
            .binary_op(
                &ctx,
                &SqlValue::String("foo".into()),
                &SqlValue::String("bar".into()),
                OpCode::Concat,
            )
            .unwrap(),
        SqlValue::String("foobar".into())
    );
}

#[test]
fn pad_space_comparison_and_its_range_probe_exception() {
    let collation = Collation::default_collation();
    // Pad semantics: trailing spaces are not significant
    assert_eq!(
        character::compare(&collation, "ab", "ab  ", CompareMode::Normal),
        std::cmp::Ordering::Equal
    );
    // The range-probe mode compares without padding
    assert_eq!(
        character::compare(&collation, "ab", "ab  ", CompareMode::GreaterEqualPre),
        std::cmp::Ordering::Less
    );
}

// === Datetime arithmetic ===

#[test]
fn month_addition_clamps_to_last_day() {
    let registry = registry();
    let ctx = ctx();
    let ts = registry.get_type(TypeKind::Timestamp, 0, 0).unwrap();
    let jan31 = timestamp(&registry, "2024-01-31 00:00:00");
    let out = ts
        .binary_op(&ctx, &jan31, &SqlValue::IntervalYearMonth(1), OpCode::Add)
        .unwrap();
    assert_eq!(ts.convert_to_string(&ctx, &out).unwrap(), "2024-02-29 00:00:00");

    // Into a non-leap year the clamp lands on the 28th
    let out = ts
        .binary_op(&ctx, &jan31, &SqlValue::IntervalYearMonth(13), OpCode::Add)
        .unwrap();
    assert_eq!(ts.convert_to_string(&ctx, &out).unwrap(), "2025-02-28 00:00:00");
}

#[test]
fn overlaps_is_strict_at_touching_endpoints() {
    let registry = registry();
    let dt = |s: &str| match timestamp(&registry, s) {
        SqlValue::DateTime(v) => v,
        _ => unreachable!(),
    };
    let a = Period::new(dt("2024-01-01 00:00:00"), dt("2024-01-10 00:00:00"));
    let b = Period::new(dt("2024-01-05 00:00:00"), dt("2024-01-20 00:00:00"));
    assert!(datetime::overlaps(&a, &b));

    let c = Period::new(dt("2024-01-01 00:00:00"), dt("2024-01-05 00:00:00"));
    let d = Period::new(dt("2024-01-05 00:00:00"), dt("2024-01-10 00:00:00"));
    assert!(!datetime::overlaps(&c, &d));
    assert!(datetime::immediately_precedes(&c, &d));
}

#[test]
fn timestamp_scale_truncates_fraction() {
    let registry = registry();
    let ctx = ctx();
    let ts3 = registry.get_type(TypeKind::Timestamp, 0, 3).unwrap();
    let ts6 = registry.get_type(TypeKind::Timestamp, 0, 6).unwrap();
    let fine = ts6
        .convert_to_default_type(&ctx, &SqlValue::String("2024-01-01 00:00:00.123456".into()))
        .unwrap();
    let coarse = ts3.convert_to_type(&ctx, &fine, &ts6).unwrap();
    assert_eq!(
        ts3.convert_to_string(&ctx, &coarse).unwrap(),
        "2024-01-01 00:00:00.123"
    );
}

// === Interval algebra ===

#[test]
fn interval_literal_parses_to_seconds_and_nanos() {
    let registry = registry();
    let ctx = ctx();
    let t = registry.get_type(TypeKind::IntervalDayToSecond, 3, 6).unwrap();
    let varchar = registry.get_type(TypeKind::Varchar, 0, 0).unwrap();
    let v = t
        .convert_to_type(&ctx, &SqlValue::String("200 10:12:12.456789".into()), &varchar)
        .unwrap();
    assert_eq!(
        v,
        SqlValue::IntervalDaySecond(SqlInterval {
            seconds: 200 * 86_400 + 10 * 3_600 + 12 * 60 + 12,
            nanos: 456_789_000,
        })
    );
    // Leading field wider than DAY(3) is rejected
    assert!(matches!(
        t.convert_to_type(&ctx, &SqlValue::String("20000 10:00:00".into()), &varchar),
        Err(SqlError::IntervalFieldOutOfRange { .. })
    ));
}

#[test]
fn interval_add_widens_span() {
    let registry = registry();
    let hours = registry.get_type(TypeKind::IntervalHourToMinute, 2, 0).unwrap();
    let days = registry.get_type(TypeKind::IntervalDayToHour, 3, 0).unwrap();
    let combined = hours.combined_type(&days, OpCode::Add).unwrap();
    assert_eq!(combined.definition(), "INTERVAL DAY(3) TO MINUTE");

    let years = registry.get_type(TypeKind::IntervalYear, 2, 0).unwrap();
    assert!(hours.combined_type(&years, OpCode::Add).is_err());
}

#[test]
fn interval_scales_by_double_in_either_operand_order() {
    let registry = registry();
    let ctx = ctx();
    let day = registry.get_type(TypeKind::IntervalDay, 2, 0).unwrap();
    let double = registry.get_type(TypeKind::Double, 0, 0).unwrap();
    let SqlType::Interval(it) = day.resolved() else { unreachable!() };
    let two_days = interval::from_leading_units(it, 2).unwrap();

    assert!(day.combined_type(&double, OpCode::Multiply).is_ok());
    let quadrupled = day
        .binary_op(&ctx, &two_days, &SqlValue::Double(2.0), OpCode::Multiply)
        .unwrap();
    assert_eq!(quadrupled, interval::from_leading_units(it, 4).unwrap());

    let commuted = day
        .binary_op(&ctx, &SqlValue::Double(2.0), &two_days, OpCode::Multiply)
        .unwrap();
    assert_eq!(commuted, quadrupled);

    let halved = day
        .binary_op(&ctx, &two_days, &SqlValue::Double(2.0), OpCode::Divide)
        .unwrap();
    assert_eq!(halved, interval::from_leading_units(it, 1).unwrap());

    // Non-finite factors cannot become a decimal scalar
    assert!(day
        .binary_op(&ctx, &two_days, &SqlValue::Double(f64::NAN), OpCode::Multiply)
        .is_err());
}

#[test]
fn interval_scalar_arithmetic_revalidates_limits() {
    let registry = registry();
    let ctx = ctx();
    let t = registry.get_type(TypeKind::IntervalDay, 2, 0).unwrap();
    let SqlType::Interval(it) = t.resolved() else { unreachable!() };
    let sixty_days = interval::from_leading_units(it, 60).unwrap();
    assert!(matches!(
        t.binary_op(&ctx, &sixty_days, &SqlValue::Integer(2), OpCode::Multiply),
        Err(SqlError::NumericValueOutOfRange { .. })
    ));
}

// === Binary and bit ===

#[test]
fn bit_trim_size_measures_trailing_zero_bits() {
    // 0b1010_0000: last set bit is at index 3, trim size 4
    let bits = BitValue::new(vec![0b1010_0000], 8);
    assert_eq!(bits.trim_size(), 4);

    let registry = registry();
    let ctx = ctx();
    let bit4 = registry.get_type(TypeKind::Bit, 4, 0).unwrap();
    let bit8 = registry.get_type(TypeKind::Bit, 8, 0).unwrap();
    // Trailing zero bits may be dropped implicitly
    let narrowed = bit4
        .convert_to_type(&ctx, &SqlValue::Bit(bits), &bit8)
        .unwrap();
    let SqlValue::Bit(narrowed) = narrowed else { unreachable!() };
    assert_eq!(narrowed.bit_length, 4);

    // A set bit past the capacity cannot be dropped implicitly
    let wide = BitValue::new(vec![0b1010_1000], 8);
    assert!(bit4
        .convert_to_type(&ctx, &SqlValue::Bit(wide), &bit8)
        .is_err());
}

#[test]
fn binary_comparison_is_unsigned_lexicographic() {
    assert_eq!(
        binary::compare(&[0x01], &[0xFF]),
        std::cmp::Ordering::Less
    );
    assert_eq!(
        binary::compare(&[0x01, 0x00], &[0x01]),
        std::cmp::Ordering::Greater
    );
    assert_eq!(binary::compare(&[0x01], &[0x01]), std::cmp::Ordering::Equal);
}

#[test]
fn hex_cast_round_trips_through_sql_literal() {
    let registry = registry();
    let ctx = ctx();
    let varbinary = registry.get_type(TypeKind::Varbinary, 16, 0).unwrap();
    let varchar = registry.get_type(TypeKind::Varchar, 0, 0).unwrap();
    let cast = varbinary
        .cast_to_type(&ctx, &SqlValue::String("DEADBEEF".into()), &varchar)
        .unwrap();
    assert_eq!(cast.value, SqlValue::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    assert_eq!(
        varbinary.convert_to_sql_string(&ctx, &cast.value).unwrap(),
        "X'DEADBEEF'"
    );
}

// === LOB handles ===

#[test]
fn freed_lob_propagates_invalid_lob() {
    let registry = registry();
    let ctx = ctx();
    let clob = registry.get_type(TypeKind::Clob, 0, 0).unwrap();
    let varchar = registry.get_type(TypeKind::Varchar, 0, 0).unwrap();
    let stored = clob
        .convert_to_type(&ctx, &SqlValue::String("text".into()), &varchar)
        .unwrap();
    let SqlValue::Clob(handle) = &stored else { unreachable!() };
    ctx.lob_store().free(handle.id).unwrap();
    assert!(matches!(
        clob.convert_to_string(&ctx, &stored),
        Err(SqlError::InvalidLob { .. })
    ));
}
