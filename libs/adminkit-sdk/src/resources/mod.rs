//! Domain stores, one module per admin page.
//!
//! Each module exposes plain request functions (used by the stores and by
//! the pagers) plus a store type that bundles one [`ResourceStore`] per
//! resource slice.
//!
//! [`ResourceStore`]: crate::store::ResourceStore

/// Declares a closed set of wire strings as a `Copy` enum with serde,
/// `Display` and `FromStr` (case-insensitive) impls.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $label:literal {
            $( $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$( Self::$variant ),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ApiError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = Self::ALL.iter().copied().map(Self::as_str).collect();
                        let expected = allowed.join(", ");
                        $crate::error::ApiError::Validation(format!(
                            "Invalid {}: '{wanted}' (expected one of {expected})",
                            $label
                        ))
                    })
            }
        }
    };
}

pub mod dashboard;
pub mod ledger;
pub mod notifications;
pub mod system_config;
pub mod transactions;
pub mod users;

string_enum! {
    /// Sort direction for list endpoints.
    pub enum SortOrder: "sort order" {
        Asc => "ASC",
        Desc => "DESC",
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!(" ASC ".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::Desc.to_string(), "DESC");
    }

    #[test]
    fn unknown_value_lists_allowed_ones() {
        let err = "sideways".parse::<SortOrder>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid sort order: 'sideways' (expected one of ASC, DESC)"
        );
    }

    #[test]
    fn serializes_as_wire_string() {
        assert_eq!(serde_json::to_value(SortOrder::Asc).unwrap(), "ASC");
    }
}
