use crate::config::Config;
use crate::constants::{IMAGE_DATA_SIZE, SYNC_PROBE_BUDGET, VALUE_FRAME_SIZE};
use crate::error::GdmError;
use crate::frame::{Channel, FrameKind, ValueFrame};
use crate::image::{Image, destination_bit};
use crate::transport::{self, Transport};
use crate::value::{Measurement, Multiplier, Unit, parse_magnitude};
use num_enum::FromPrimitive;
use std::io::Cursor;
use std::time::Duration;

fn field(text: &str) -> [u8; 12] {
    text.as_bytes().try_into().expect("field must be 12 bytes")
}

#[test]
fn test_multiplier_from_tag() {
    let cases = [
        (b'n', Multiplier::Nano, 1e-9),
        (b'u', Multiplier::Micro, 1e-6),
        (b'm', Multiplier::Milli, 1e-3),
        (b' ', Multiplier::None, 1.0),
        (b'k', Multiplier::Kilo, 1e3),
        (b'M', Multiplier::Mega, 1e6),
    ];
    for (tag, multiplier, factor) in cases {
        assert_eq!(Multiplier::from_primitive(tag), multiplier);
        assert_eq!(multiplier.tag(), char::from(tag));
        assert_eq!(multiplier.factor(), factor);
    }
    // anything else reads as no multiplier
    assert_eq!(Multiplier::from_primitive(b'x'), Multiplier::None);
    assert_eq!(Multiplier::from_primitive(b'K'), Multiplier::None);
}

#[test]
fn test_unit_symbols_and_coupling() {
    assert_eq!(Unit::VoltAc.to_string(), "V");
    assert_eq!(Unit::Ohm.to_string(), "Ohm");
    assert_eq!(Unit::Celsius.to_string(), "°C");
    assert_eq!(Unit::RelativeHumidity.to_string(), "RH");
    assert_eq!(Unit::Unknown.to_string(), "UNK");

    assert_eq!(Unit::VoltAc.coupling(), Some("AC"));
    assert_eq!(Unit::AmpereDc.coupling(), Some("DC"));
    assert_eq!(Unit::Hertz.coupling(), None);
}

#[test]
fn test_unit_from_shared_descriptors() {
    assert_eq!(Unit::from_field(&field("  50.000kHz ")), Unit::Hertz);
    assert_eq!(Unit::from_field(&field("  12.00 Vdc ")), Unit::VoltDc);
    assert_eq!(Unit::from_field(&field("  12.00     ")), Unit::Unknown);
    assert_eq!(Unit::from_field(&field("O  23.5 @C  ")), Unit::Celsius);
    assert_eq!(Unit::from_field(&field("O  23.5     ")), Unit::Unknown);
    assert_eq!(Unit::from_field(&field("R  0.512 Aac")), Unit::AmpereAc);
    assert_eq!(Unit::from_field(&field("R  0.512    ")), Unit::Unknown);
    assert_eq!(Unit::from_field(&field("Z  0.512    ")), Unit::Unknown);
}

#[test]
fn test_parse_magnitude() {
    assert_eq!(parse_magnitude(b"  1234", '.'), 1234.0);
    assert_eq!(parse_magnitude(b" -0.25", '.'), -0.25);
    assert_eq!(parse_magnitude(b" +1.50", '.'), 1.5);
    assert_eq!(parse_magnitude(b"      ", '.'), 0.0);
    assert_eq!(parse_magnitude(b"  -   ", '.'), 0.0);
    assert_eq!(parse_magnitude(b"  .5  ", '.'), 0.5);
    // configured separator, and '.' still accepted
    assert_eq!(parse_magnitude(b" 12,34", ','), 12.34);
    assert_eq!(parse_magnitude(b" 12.34", ','), 12.34);
    // stops at the first character that cannot continue the number
    assert_eq!(parse_magnitude(b"1.2.3 ", '.'), 1.2);
    assert_eq!(parse_magnitude(b" 0L   ", '.'), 0.0);
    assert_eq!(parse_magnitude(b" 42mV ", '.'), 42.0);
}

#[test]
fn test_decode_non_ascii_descriptor_is_unknown() {
    let mut bytes = field("D  1.000 Vdc");
    bytes[0] = 0xB0;
    let m = Measurement::decode(&bytes, '.');
    assert_eq!(m.unit, Unit::Unknown);
    assert_eq!(m.value, 1.0);
    assert_eq!(m.multiplier, Multiplier::None);
}

#[test]
fn test_decode_non_ascii_in_number_stops_parsing() {
    let mut bytes = field("D  12.34 Vdc");
    bytes[5] = 0xFF;
    let m = Measurement::decode(&bytes, '.');
    assert_eq!(m.value, 12.0);
    assert_eq!(m.unit, Unit::VoltDc);
}

#[test]
fn test_measurement_display_and_scale() {
    let m = Measurement::decode(&field("K  150.0mA  "), '.');
    assert_eq!(m.to_string(), "150.000 mA AC");
    assert!((m.scaled_value() - 0.15).abs() < 1e-9);

    let m = Measurement::decode(&field("E  4.700kOhm"), '.');
    assert_eq!(m.to_string(), "4.700 kOhm");
}

#[test]
fn test_frame_kind() {
    assert_eq!(FrameKind::from_tag(b'Z'), FrameKind::Image);
    assert_eq!(FrameKind::from_tag(b'D'), FrameKind::Value);
    assert_eq!(FrameKind::from_tag(b' '), FrameKind::Value);
    assert_eq!(FrameKind::Value.body_len(), 23);
    assert_eq!(FrameKind::Image.body_len(), IMAGE_DATA_SIZE);
}

#[test]
fn test_value_frame_fields() {
    let bytes: [u8; VALUE_FRAME_SIZE] = *b"\x02D  12.34 VdcA  1.234mVac\x03";
    let frame = ValueFrame::new(bytes);

    assert!(frame.is_terminated());
    assert_eq!(&frame.field(Channel::Primary), b"D  12.34 Vdc");
    assert_eq!(&frame.field(Channel::Secondary), b"A  1.234mVac");
    assert!(format!("{:?}", frame).contains("0244"));
}

#[test]
fn test_destination_bit() {
    assert_eq!(destination_bit(2, 0), 0);
    assert_eq!(destination_bit(2, 8), 1);
    assert_eq!(destination_bit(2, 1), 128);
    assert_eq!(destination_bit(2, 7), 7 * 128);
    assert_eq!(destination_bit(130, 0), 1024);
    assert_eq!(destination_bit(26, 0), 24);
    // the end marker lands past the plane
    assert!(destination_bit(1026, 0) >= 128 * 64);
}

#[test]
fn test_image_basics() {
    let mut image = Image::try_new().unwrap();
    assert_eq!(image.as_bytes().len(), IMAGE_DATA_SIZE);
    assert_eq!(image.count_set(), 0);
    assert_eq!((image.width(), image.height()), (128, 64));

    image.unpack_chunk(2, &[0x01]);
    assert!(image.pixel(0, 0));
    assert!(!image.pixel(64, 0));
    assert!(!image.pixel(0, 128));
    assert_eq!(image.row(0).filter(|&p| p).count(), 1);

    image.clear();
    assert_eq!(image.count_set(), 0);
}

#[test]
fn test_unpack_ignores_header_bytes() {
    let mut image = Image::try_new().unwrap();
    image.unpack_chunk(0, &[0xFF, 0xFF, 0x01]);
    assert_eq!(image.count_set(), 1);
    assert!(image.pixel(0, 0));
}

#[test]
fn test_read_exact_on_cursor() {
    let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5]);
    let mut buf = [0u8; 3];

    assert_eq!(transport::read_exact(&mut cursor, &mut buf).unwrap(), 3);
    assert_eq!(buf, [1, 2, 3]);
    assert_eq!(cursor.bytes_to_read().unwrap(), 2);

    let err = transport::read_exact(&mut cursor, &mut buf).unwrap_err();
    assert!(matches!(err, GdmError::Timeout));
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.decimal_separator, '.');
    assert_eq!(config.sync_probe_budget, SYNC_PROBE_BUDGET);
    assert_eq!(config.baud_rate, 9600);
    assert_eq!(config.read_timeout, Duration::from_secs(1));

    let config = config.with_baud_rate(19200).with_read_timeout(Duration::from_millis(250));
    assert_eq!(config.baud_rate, 19200);
    assert_eq!(config.read_timeout, Duration::from_millis(250));
}

#[test]
fn test_error_recoverability() {
    assert!(GdmError::Timeout.is_recoverable());
    assert!(GdmError::SyncLost("x".into()).is_recoverable());
    assert!(!GdmError::ResourceExhausted.is_recoverable());
    assert!(!GdmError::CallbackAborted("x".into()).is_recoverable());
}
