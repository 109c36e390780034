//! MySQL POINT (WKB) 디코딩
//!
//! 형식:
//!   - SRID 없음 (21 bytes): byte order (1) + WKB type (4) + X (8) + Y (8)
//!   - SRID 포함 (25 bytes): SRID (4, big-endian) + 위 21 bytes
//!
//! byte order: 0 = big-endian, 1 = little-endian

use crate::error::{ConvertError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

const WKB_POINT_SIZE: usize = 21;
const WKB_POINT_WITH_SRID_SIZE: usize = 25;
const WKB_TYPE_POINT: u32 = 1;

/// WKB POINT 디코더
pub struct GeometryDecoder;

impl GeometryDecoder {
    /// POINT 바이너리를 (x, y)로 디코딩. None이면 원점
    pub fn decode_point(binary: Option<&[u8]>) -> Result<(f64, f64)> {
        let Some(binary) = binary else {
            return Ok((0.0, 0.0));
        };

        let wkb = match binary.len() {
            WKB_POINT_SIZE => binary,
            // SRID는 좌표 변환에 사용하지 않음
            WKB_POINT_WITH_SRID_SIZE => &binary[4..],
            len => {
                return Err(ConvertError::MalformedBinary(format!(
                    "Invalid binary length for WKB POINT: {}",
                    len
                )))
            }
        };

        match wkb[0] {
            0 => Self::read_point::<BigEndian>(wkb),
            1 => Self::read_point::<LittleEndian>(wkb),
            other => Err(ConvertError::MalformedBinary(format!(
                "Invalid byte order in WKB POINT: {}",
                other
            ))),
        }
    }

    /// SRID 접두사 추출 (25 bytes 형식에서만)
    pub fn srid(binary: &[u8]) -> Option<u32> {
        if binary.len() == WKB_POINT_WITH_SRID_SIZE {
            Some(BigEndian::read_u32(&binary[0..4]))
        } else {
            None
        }
    }

    fn read_point<B: ByteOrder>(wkb: &[u8]) -> Result<(f64, f64)> {
        let wkb_type = B::read_u32(&wkb[1..5]);
        if wkb_type != WKB_TYPE_POINT {
            return Err(ConvertError::MalformedBinary(format!(
                "Not a WKB POINT type: {}",
                wkb_type
            )));
        }

        let x = B::read_f64(&wkb[5..13]);
        let y = B::read_f64(&wkb[13..21]);
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn encode_point<B: ByteOrder>(x: f64, y: f64, srid: Option<u32>, order_flag: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        if let Some(srid) = srid {
            buf.write_u32::<BigEndian>(srid).unwrap();
        }
        buf.write_u8(order_flag).unwrap();
        buf.write_u32::<B>(WKB_TYPE_POINT).unwrap();
        buf.write_f64::<B>(x).unwrap();
        buf.write_f64::<B>(y).unwrap();
        buf
    }

    #[test]
    fn test_big_endian_point() {
        let wkb = encode_point::<BigEndian>(1.0, 2.0, None, 0);
        assert_eq!(wkb.len(), 21);
        assert_eq!(GeometryDecoder::decode_point(Some(wkb.as_slice())).unwrap(), (1.0, 2.0));
    }

    #[test]
    fn test_both_orders_with_and_without_srid() {
        let coords = [(10.0, 20.0), (-73.985_656, 40.748_433), (f64::MAX, f64::MIN_POSITIVE)];
        for (x, y) in coords {
            for srid in [None, Some(4326)] {
                let be = encode_point::<BigEndian>(x, y, srid, 0);
                let le = encode_point::<LittleEndian>(x, y, srid, 1);
                assert_eq!(GeometryDecoder::decode_point(Some(be.as_slice())).unwrap(), (x, y));
                assert_eq!(GeometryDecoder::decode_point(Some(le.as_slice())).unwrap(), (x, y));
            }
        }
    }

    #[test]
    fn test_srid_prefix() {
        let wkb = encode_point::<LittleEndian>(1.0, 1.0, Some(4326), 1);
        assert_eq!(GeometryDecoder::srid(&wkb), Some(4326));
        let wkb = encode_point::<LittleEndian>(1.0, 1.0, None, 1);
        assert_eq!(GeometryDecoder::srid(&wkb), None);
    }

    #[test]
    fn test_null_is_origin() {
        assert_eq!(GeometryDecoder::decode_point(None).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_invalid_payloads() {
        let mut wkb = encode_point::<LittleEndian>(1.0, 2.0, None, 1);
        wkb[0] = 7;
        assert!(GeometryDecoder::decode_point(Some(wkb.as_slice())).is_err());

        // LINESTRING (type 2)
        let mut wkb = encode_point::<LittleEndian>(1.0, 2.0, None, 1);
        wkb[1] = 2;
        assert!(GeometryDecoder::decode_point(Some(wkb.as_slice())).is_err());

        for len in [0, 1, 20, 22, 24, 26] {
            let payload = vec![1u8; len];
            assert!(matches!(
                GeometryDecoder::decode_point(Some(payload.as_slice())),
                Err(ConvertError::MalformedBinary(_))
            ));
        }
    }
}
