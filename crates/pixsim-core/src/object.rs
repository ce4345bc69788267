//! The [`Object`] trait shared by every record carried inside a message.

use std::fmt;

/// Common identity for records exchanged between modules.
///
/// Objects carry no payload of their own. The trait exists so that
/// record collections can be stored and rendered uniformly. Rendering
/// goes through `Display`; the default [`Object::describe`] simply
/// formats the record.
pub trait Object: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Short human-readable type name, e.g. `"DepositedCharge"`.
    fn type_name(&self) -> &'static str;

    /// Human-readable rendering of the record.
    fn describe(&self) -> String {
        format!("{}: {}", self.type_name(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker(u32);

    impl fmt::Display for Marker {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "marker #{}", self.0)
        }
    }

    impl Object for Marker {
        fn type_name(&self) -> &'static str {
            "Marker"
        }
    }

    #[test]
    fn describe_combines_type_and_display() {
        assert_eq!(Marker(3).describe(), "Marker: marker #3");
    }

    #[test]
    fn objects_are_usable_as_trait_objects() {
        let records: Vec<Box<dyn Object>> = vec![Box::new(Marker(1)), Box::new(Marker(2))];
        let rendered: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered, vec!["marker #1", "marker #2"]);
    }
}
