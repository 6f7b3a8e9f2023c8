//! Case conversion for field and type names
//!
//! Relation metadata stores attribute names in snake_case while projectors
//! may declare fields in camelCase; both spellings must resolve to the same
//! attribute.

/// Utility for converting between naming conventions of field identifiers
pub struct Caser;

impl Caser {
    /// Convert a camelCase or PascalCase identifier to snake_case
    ///
    /// # Examples
    ///
    /// ```
    /// use facet::core::strcase::Caser;
    ///
    /// assert_eq!(Caser::snake("createdUser"), "created_user");
    /// assert_eq!(Caser::snake("OrderItem"), "order_item");
    /// assert_eq!(Caser::snake("already_snake"), "already_snake");
    /// ```
    pub fn snake(name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);

        for (i, ch) in name.chars().enumerate() {
            if ch.is_uppercase() {
                if i > 0 && !out.ends_with('_') {
                    out.push('_');
                }
                for lower in ch.to_lowercase() {
                    out.push(lower);
                }
            } else {
                out.push(ch);
            }
        }

        out
    }

    /// Convert a snake_case identifier to camelCase
    pub fn camel(name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut upper_next = false;

        for ch in name.chars() {
            if ch == '_' {
                upper_next = true;
            } else if upper_next {
                for upper in ch.to_uppercase() {
                    out.push(upper);
                }
                upper_next = false;
            } else {
                out.push(ch);
            }
        }

        out
    }

    /// The last `::`-separated segment of a fully-qualified type name
    ///
    /// ```
    /// use facet::core::strcase::Caser;
    ///
    /// assert_eq!(Caser::base_name("shop::models::Order"), "Order");
    /// assert_eq!(Caser::base_name("Order"), "Order");
    /// ```
    pub fn base_name(type_name: &str) -> &str {
        type_name.rsplit("::").next().unwrap_or(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_from_camel() {
        assert_eq!(Caser::snake("updatedUser"), "updated_user");
        assert_eq!(Caser::snake("someLongFieldName"), "some_long_field_name");
    }

    #[test]
    fn test_snake_from_pascal() {
        assert_eq!(Caser::snake("ProductCategory"), "product_category");
    }

    #[test]
    fn test_snake_is_idempotent() {
        assert_eq!(Caser::snake("created_at"), "created_at");
        assert_eq!(Caser::snake(Caser::snake("createdAt").as_str()), "created_at");
    }

    #[test]
    fn test_camel_from_snake() {
        assert_eq!(Caser::camel("created_user"), "createdUser");
        assert_eq!(Caser::camel("label"), "label");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(Caser::base_name("crm::models::Customer"), "Customer");
        assert_eq!(Caser::base_name(""), "");
    }
}
