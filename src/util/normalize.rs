use crate::models::smart::{Attribute, AttributeTable};
use crate::util::lookup;

/// Divisor that maps a vendor's normalized scale back onto 0-100.
pub fn scale_for(value: f64) -> Option<f64> {
    if value <= 100.0 {
        None
    } else if value <= 120.0 {
        // Kingston SSDs
        Some(1.2)
    } else if value <= 200.0 {
        // WD drives
        Some(2.0)
    } else if value <= 253.0 {
        // Samsung SSDs, https://kb.vmware.com/s/article/2040405
        Some(2.53)
    } else {
        Some(value / 100.0)
    }
}

/// Rescale value and threshold of one attribute in place.
pub fn rescale(attr: &mut Attribute) {
    if let Some(scale) = scale_for(attr.value) {
        attr.value /= scale;
        attr.threshold /= scale;
    }
}

/// Replace `Unknown Attribute` placeholders with a display name.
pub fn display_name(attr: &mut Attribute) {
    if attr.name.starts_with("Unknown") && attr.name.ends_with("Attribute") {
        attr.name = match lookup::attribute_name(attr.id) {
            Some(name) => name.to_string(),
            None       => format!("{} {}", attr.name, attr.id),
        };
    }
}

pub fn normalize(attrs: &mut AttributeTable) {
    for attr in attrs.values_mut() {
        rescale(attr);
        display_name(attr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn attr(id: u8, name: &str, value: f64, threshold: f64) -> Attribute {
        Attribute {
            id,
            name: name.to_string(),
            value,
            worst: value,
            threshold,
            attr_type: "old age".to_string(),
            raw: 0,
        }
    }

    #[test]
    fn values_in_range_are_untouched() {
        let mut a = attr(5, "Reallocated Sector Ct", 100.0, 10.0);
        rescale(&mut a);
        assert_eq!(a.value, 100.0);
        assert_eq!(a.threshold, 10.0);
        rescale(&mut a);
        assert_eq!(a.value, 100.0);
    }

    #[test]
    fn wd_scale() {
        let mut a = attr(5, "Reallocated Sector Ct", 190.0, 140.0);
        rescale(&mut a);
        assert_relative_eq!(a.value, 95.0);
        assert_relative_eq!(a.threshold, 70.0);
    }

    #[test]
    fn samsung_scale() {
        let mut a = attr(177, "Wear Leveling Count", 253.0, 0.0);
        rescale(&mut a);
        assert_relative_eq!(a.value, 100.0, epsilon = 1e-9);
        assert_eq!(a.threshold, 0.0);
    }

    #[test]
    fn kingston_and_out_of_range_scales() {
        assert_eq!(scale_for(120.0), Some(1.2));
        assert_eq!(scale_for(121.0), Some(2.0));
        assert_eq!(scale_for(300.0), Some(3.0));
        assert_eq!(scale_for(100.0), None);
    }

    #[test]
    fn placeholder_names() {
        let mut known = attr(231, "Unknown Attribute", 90.0, 0.0);
        display_name(&mut known);
        assert_eq!(known.name, "SSD Life Left");

        let mut unknown = attr(6, "Unknown SSD Attribute", 90.0, 0.0);
        display_name(&mut unknown);
        assert_eq!(unknown.name, "Unknown SSD Attribute 6");

        let mut named = attr(9, "Power On Hours", 90.0, 0.0);
        display_name(&mut named);
        assert_eq!(named.name, "Power On Hours");
    }
}
