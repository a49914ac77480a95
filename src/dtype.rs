//! Declared pixel types, fill conversion, and the signed kinds a grid can be widened to.

use std::fmt;

use crate::error::{ExtentError, Result};
use crate::plan::Axis;

/// Data type declared by the input band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Map a GDAL data type name. `signed_byte` is set when a `Byte` band carries
    /// `PIXELTYPE=SIGNEDBYTE`, the pre-3.7 encoding of int8.
    pub fn from_gdal_name(name: &str, signed_byte: bool) -> Result<Self> {
        let ty = match name {
            "Byte" if signed_byte => PixelType::Int8,
            "Byte" => PixelType::UInt8,
            "Int8" => PixelType::Int8,
            "UInt16" => PixelType::UInt16,
            "Int16" => PixelType::Int16,
            "UInt32" => PixelType::UInt32,
            "Int32" => PixelType::Int32,
            "Float32" => PixelType::Float32,
            "Float64" => PixelType::Float64,
            other => return Err(ExtentError::UnsupportedDtype(other.to_string())),
        };
        Ok(ty)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PixelType::UInt8 => "uint8",
            PixelType::Int8 => "int8",
            PixelType::UInt16 => "uint16",
            PixelType::Int16 => "int16",
            PixelType::UInt32 => "uint32",
            PixelType::Int32 => "int32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        }
    }

    /// Inclusive value range of integer types, `None` for floats.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            PixelType::UInt8 => Some((0, u8::MAX as i64)),
            PixelType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            PixelType::UInt16 => Some((0, u16::MAX as i64)),
            PixelType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            PixelType::UInt32 => Some((0, u32::MAX as i64)),
            PixelType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            PixelType::Float32 | PixelType::Float64 => None,
        }
    }

    /// Whether `fill` is exactly representable in this type.
    pub fn can_hold(&self, fill: i64) -> bool {
        match self {
            PixelType::UInt8 => u8::from_fill(fill).is_some(),
            PixelType::Int8 => i8::from_fill(fill).is_some(),
            PixelType::UInt16 => u16::from_fill(fill).is_some(),
            PixelType::Int16 => i16::from_fill(fill).is_some(),
            PixelType::UInt32 => u32::from_fill(fill).is_some(),
            PixelType::Int32 => i32::from_fill(fill).is_some(),
            PixelType::Float32 => f32::from_fill(fill).is_some(),
            PixelType::Float64 => f64::from_fill(fill).is_some(),
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A grid cell type that integer fill values convert into.
pub trait Cell: Copy {
    /// Exact conversion of `fill`, `None` when it would change the value.
    fn from_fill(fill: i64) -> Option<Self>;
}

impl Cell for u8 {
    fn from_fill(fill: i64) -> Option<Self> {
        u8::try_from(fill).ok()
    }
}

impl Cell for i8 {
    fn from_fill(fill: i64) -> Option<Self> {
        i8::try_from(fill).ok()
    }
}

impl Cell for u16 {
    fn from_fill(fill: i64) -> Option<Self> {
        u16::try_from(fill).ok()
    }
}

impl Cell for i16 {
    fn from_fill(fill: i64) -> Option<Self> {
        i16::try_from(fill).ok()
    }
}

impl Cell for u32 {
    fn from_fill(fill: i64) -> Option<Self> {
        u32::try_from(fill).ok()
    }
}

impl Cell for i32 {
    fn from_fill(fill: i64) -> Option<Self> {
        i32::try_from(fill).ok()
    }
}

impl Cell for f32 {
    fn from_fill(fill: i64) -> Option<Self> {
        let v = fill as f32;
        // `as i64` saturates, so 2^63 itself must be excluded
        (v.abs() < i64::MAX as f32 && v as i64 == fill).then_some(v)
    }
}

impl Cell for f64 {
    fn from_fill(fill: i64) -> Option<Self> {
        let v = fill as f64;
        (v.abs() < i64::MAX as f64 && v as i64 == fill).then_some(v)
    }
}

/// Signed integer kinds a grid can be widened to when a fill does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StorageKind {
    Int8,
    Int16,
    Int32,
}

impl StorageKind {
    pub const ALL: [StorageKind; 3] = [StorageKind::Int8, StorageKind::Int16, StorageKind::Int32];

    pub fn name(&self) -> &'static str {
        self.pixel_type().name()
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            StorageKind::Int8 => PixelType::Int8,
            StorageKind::Int16 => PixelType::Int16,
            StorageKind::Int32 => PixelType::Int32,
        }
    }

    /// Inclusive value range of the kind.
    pub fn range(&self) -> (i64, i64) {
        match self {
            StorageKind::Int8 => (i8::MIN as i64, i8::MAX as i64),
            StorageKind::Int16 => (i16::MIN as i64, i16::MAX as i64),
            StorageKind::Int32 => (i32::MIN as i64, i32::MAX as i64),
        }
    }

    pub fn can_hold(&self, value: i64) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&value)
    }

    /// Smallest kind holding every value of `ty` plus `fill`.
    ///
    /// Float types, and integer types too wide for int32, are `UnsupportedDtype`.
    /// A fill outside int32 on an otherwise widenable type is `FillOutOfRange`.
    pub fn widening(ty: PixelType, axis: Axis, fill: i64) -> Result<Self> {
        let (lo, hi) = ty
            .integer_range()
            .ok_or_else(|| ExtentError::UnsupportedDtype(ty.name().to_string()))?;
        let covers = |k: &StorageKind, a: i64, b: i64| k.can_hold(a) && k.can_hold(b);

        if let Some(kind) = Self::ALL
            .into_iter()
            .find(|k| covers(k, lo.min(fill), hi.max(fill)))
        {
            return Ok(kind);
        }

        if covers(&StorageKind::Int32, lo, hi) {
            Err(ExtentError::FillOutOfRange {
                axis,
                fill,
                dtype: ty.name().to_string(),
            })
        } else {
            Err(ExtentError::UnsupportedDtype(ty.name().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gdal_names() {
        assert_eq!(PixelType::from_gdal_name("Byte", false).unwrap(), PixelType::UInt8);
        assert_eq!(PixelType::from_gdal_name("Byte", true).unwrap(), PixelType::Int8);
        assert_eq!(PixelType::from_gdal_name("Int8", false).unwrap(), PixelType::Int8);
        assert_eq!(PixelType::from_gdal_name("Float32", false).unwrap(), PixelType::Float32);
        assert!(matches!(
            PixelType::from_gdal_name("CFloat32", false),
            Err(ExtentError::UnsupportedDtype(name)) if name == "CFloat32"
        ));
    }

    #[test]
    fn test_can_hold() {
        assert!(PixelType::UInt8.can_hold(0));
        assert!(PixelType::UInt8.can_hold(255));
        assert!(!PixelType::UInt8.can_hold(-128));
        assert!(PixelType::Int8.can_hold(-128));
        assert!(!PixelType::Int8.can_hold(128));
        assert!(PixelType::Float32.can_hold(-9999));
        assert!(!PixelType::Float32.can_hold((1 << 24) + 1));
        assert!(PixelType::Float64.can_hold((1 << 24) + 1));
        assert!(!PixelType::Float64.can_hold(i64::MAX));
    }

    #[test]
    fn test_widening_picks_smallest_kind() {
        assert_eq!(
            StorageKind::widening(PixelType::UInt8, Axis::Rows, -128).unwrap(),
            StorageKind::Int16
        );
        assert_eq!(
            StorageKind::widening(PixelType::Int8, Axis::Rows, 300).unwrap(),
            StorageKind::Int16
        );
        assert_eq!(
            StorageKind::widening(PixelType::Int16, Axis::Rows, 40000).unwrap(),
            StorageKind::Int32
        );
        assert_eq!(
            StorageKind::widening(PixelType::UInt16, Axis::Columns, -1).unwrap(),
            StorageKind::Int32
        );
    }

    #[test]
    fn test_widening_reports_unsupported_types() {
        for ty in [PixelType::Float32, PixelType::Float64, PixelType::UInt32] {
            match StorageKind::widening(ty, Axis::Rows, -1) {
                Err(ExtentError::UnsupportedDtype(name)) => assert_eq!(name, ty.name()),
                other => panic!("expected UnsupportedDtype for {}, got {:?}", ty, other),
            }
        }
    }

    #[test]
    fn test_widening_rejects_fill_beyond_int32() {
        assert!(matches!(
            StorageKind::widening(PixelType::Int16, Axis::Columns, 1 << 40),
            Err(ExtentError::FillOutOfRange { axis: Axis::Columns, .. })
        ));
    }
}
