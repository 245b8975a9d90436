//! Purpose: Describe the finite identifier domains that schema columns are drawn from.
//! Exports: `Column`, the `columns!` macro, `FieldDomain`, `Field`.
//! Role: Gives schemas an O(1) dense index per identifier plus a domain identity check.
//! Invariants: `ordinal() < domain_len()` for every identifier of a well-formed domain.
//! Invariants: Identifiers from distinct `FieldDomain`s never compare equal.
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::Schema;

/// An identifier drawn from a finite, enumerable domain.
pub trait Column: Copy + Eq + fmt::Debug {
    /// Dense position of this identifier within its domain.
    fn ordinal(self) -> usize;

    /// Number of identifiers in the whole domain, configured or not.
    fn domain_len(self) -> usize;

    /// Identity of the domain; statically enumerated domains share id 0.
    fn domain_id(self) -> u64 {
        0
    }
}

/// Declares a fieldless enum usable as a schema column.
///
/// The generated enum derives `Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd`
/// and gains an `ALL` constant listing variants in declaration order plus `name()`.
///
/// ```
/// rowpack::columns! {
///     pub enum Sensor { Temperature, Pressure, Humidity }
/// }
/// use rowpack::api::Column;
/// assert_eq!(Sensor::Pressure.ordinal(), 1);
/// assert_eq!(Sensor::Humidity.domain_len(), 3);
/// ```
#[macro_export]
macro_rules! columns {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl $crate::core::column::Column for $name {
            fn ordinal(self) -> usize {
                self as usize
            }

            fn domain_len(self) -> usize {
                Self::ALL.len()
            }
        }
    };
}

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// A column identifier resolved from a runtime `FieldDomain`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Field {
    domain: u64,
    ordinal: u32,
    domain_len: u32,
}

impl Column for Field {
    fn ordinal(self) -> usize {
        self.ordinal as usize
    }

    fn domain_len(self) -> usize {
        self.domain_len as usize
    }

    fn domain_id(self) -> u64 {
        self.domain
    }
}

/// A named identifier domain fixed at construction, e.g. the field names of a record stream.
#[derive(Debug)]
pub struct FieldDomain {
    id: u64,
    names: Box<[String]>,
    index: HashMap<String, u32>,
}

impl FieldDomain {
    pub fn new<I, S>(names: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::new(ErrorKind::Config).with_message("empty field domain"));
        }
        let len = u32::try_from(names.len())
            .map_err(|_| Error::new(ErrorKind::Config).with_message("field domain too large"))?;

        let mut index = HashMap::with_capacity(names.len());
        for (ordinal, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::new(ErrorKind::Config).with_message("empty field name"));
            }
            if index.insert(name.clone(), ordinal as u32).is_some() {
                return Err(Error::new(ErrorKind::Config)
                    .with_message("duplicate field name in domain")
                    .with_column(name.clone()));
            }
        }
        debug_assert_eq!(index.len(), len as usize);

        Ok(Self {
            id: NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed),
            names: names.into_boxed_slice(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.index.get(name).map(|&ordinal| Field {
            domain: self.id,
            ordinal,
            domain_len: self.names.len() as u32,
        })
    }

    /// Name of `field`, or `None` when it belongs to another domain.
    pub fn name(&self, field: Field) -> Option<&str> {
        if field.domain != self.id {
            return None;
        }
        self.names.get(field.ordinal as usize).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        let domain_len = self.names.len() as u32;
        (0..domain_len).map(move |ordinal| Field {
            domain: self.id,
            ordinal,
            domain_len,
        })
    }

    /// Builds a schema whose row layout follows `names`.
    pub fn schema<I, S>(&self, names: I) -> Result<Schema<Field>, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns = Vec::new();
        let mut labels = Vec::new();
        let mut seen = vec![false; self.names.len()];
        for name in names {
            let name = name.as_ref();
            let field = self.field(name).ok_or_else(|| {
                Error::new(ErrorKind::Config)
                    .with_message("column is not part of the field domain")
                    .with_column(name)
            })?;
            if mem::replace(&mut seen[field.ordinal as usize], true) {
                return Err(Error::new(ErrorKind::Config)
                    .with_message("duplicate column")
                    .with_column(name));
            }
            columns.push(field);
            labels.push(name.to_string());
        }
        Ok(Schema::new(columns)?.with_labels(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, FieldDomain};
    use crate::core::error::ErrorKind;

    crate::columns! {
        enum Letter { A, B, C }
    }

    #[test]
    fn enum_ordinals_follow_declaration_order() {
        assert_eq!(Letter::ALL, &[Letter::A, Letter::B, Letter::C]);
        assert_eq!(Letter::C.ordinal(), 2);
        assert_eq!(Letter::A.domain_len(), 3);
        assert_eq!(Letter::B.domain_id(), 0);
        assert_eq!(Letter::B.name(), "B");
    }

    #[test]
    fn field_domain_resolves_names() {
        let domain = FieldDomain::new(["x", "y", "z"]).expect("domain");
        let y = domain.field("y").expect("y");
        assert_eq!(y.ordinal(), 1);
        assert_eq!(y.domain_len(), 3);
        assert_eq!(domain.name(y), Some("y"));
        assert!(domain.field("w").is_none());
        assert_eq!(domain.fields().count(), 3);
    }

    #[test]
    fn field_domains_are_distinct() {
        let first = FieldDomain::new(["x"]).expect("first");
        let second = FieldDomain::new(["x"]).expect("second");
        let a = first.field("x").expect("x");
        let b = second.field("x").expect("x");
        assert_ne!(a, b);
        assert_ne!(a.domain_id(), b.domain_id());
        assert_eq!(second.name(a), None);
    }

    #[test]
    fn field_domain_rejects_bad_names() {
        let err = FieldDomain::new(Vec::<String>::new()).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = FieldDomain::new(["x", "y", "x"]).expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.column(), Some("x"));

        let err = FieldDomain::new(["x", ""]).expect_err("blank");
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn schema_from_unknown_name_fails() {
        let domain = FieldDomain::new(["x", "y"]).expect("domain");
        let err = domain.schema(["y", "q"]).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.column(), Some("q"));

        let schema = domain.schema(["y", "x"]).expect("schema");
        assert_eq!(schema.row_width(), 2);
        assert_eq!(schema.offset_of(domain.field("x").expect("x")), Some(1));
    }

    #[test]
    fn schema_errors_name_fields() {
        let domain = FieldDomain::new(["a", "b"]).expect("domain");
        let err = domain.schema(["a", "a"]).expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.column(), Some("a"));

        let schema = domain.schema(["b", "a"]).expect("schema");
        let a = domain.field("a").expect("a");
        assert_eq!(schema.label(a), "a");
        let other = FieldDomain::new(["a"]).expect("other");
        assert!(schema.label(other.field("a").expect("a")).starts_with("Field"));
    }
}
