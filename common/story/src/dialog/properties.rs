use super::ExposedProperty;

/// Appends `(1)` until the name is not taken.
/// Each collision appends another suffix, so the third `Health` becomes
/// `Health(1)(1)`.
pub(crate) fn unique_property_name(
    existing: &[ExposedProperty],
    mut name: String,
) -> String {
    while existing.iter().any(|property| property.name == name) {
        name.push_str("(1)");
    }

    name
}

/// For each property in order, every `[name]` is replaced with the value.
///
/// Replacement doesn't rescan what it inserted, so a value containing its
/// own token stays as is.
/// A value containing the token of a property further down the list is
/// expanded by that property's pass.
pub(super) fn substitute(properties: &[ExposedProperty], text: &str) -> String {
    properties.iter().fold(text.to_owned(), |text, property| {
        let token = format!("[{}]", property.name);
        if text.contains(&token) {
            text.replace(&token, &property.value)
        } else {
            text
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Vec<ExposedProperty> {
        pairs
            .iter()
            .map(|(name, value)| ExposedProperty::new(*name, *value))
            .collect()
    }

    #[test]
    fn it_leaves_plain_text_unchanged() {
        let properties = props(&[("Name", "Ada"), ("Town", "Brno")]);

        for text in ["", "Hello there", "Name and Town", "[]", "[name]"] {
            assert_eq!(text, substitute(&properties, text));
        }
    }

    #[test]
    fn it_replaces_every_occurrence() {
        let properties = props(&[("Name", "Ada")]);

        assert_eq!(
            "Ada, oh Ada!",
            substitute(&properties, "[Name], oh [Name]!")
        );
    }

    #[test]
    fn it_substitutes_in_insertion_order() {
        let properties = props(&[("Greeting", "Hi [Name]"), ("Name", "Ada")]);
        assert_eq!("Hi Ada", substitute(&properties, "[Greeting]"));

        let properties = props(&[("Name", "Ada"), ("Greeting", "Hi [Name]")]);
        assert_eq!("Hi [Name]", substitute(&properties, "[Greeting]"));
    }

    #[test]
    fn it_does_not_expand_self_reference() {
        let properties = props(&[("Loop", "[Loop][Loop]")]);

        assert_eq!("[Loop][Loop]!", substitute(&properties, "[Loop]!"));
    }

    #[test]
    fn it_finds_unique_name() {
        let existing = props(&[("Health", ""), ("Health(1)", "")]);

        assert_eq!(
            "Health(1)(1)",
            unique_property_name(&existing, "Health".to_owned())
        );
        assert_eq!("Mana", unique_property_name(&existing, "Mana".to_owned()));
    }
}
