/// Converts a snake_case identifier to camelCase.
/// Anything holding an underscore (`USER_EMAIL`, `USER_email`) or written in capitals only is
/// lower-cased first. Other identifiers keep their inner casing so that converting an already
/// camelCase identifier gives it back.
///
/// ## Parameters:
/// * `snake_case` (`&str`): Identifier to convert, eg. `user_email`.
///
/// ## Returns:
/// * (`String`): camelCase form, eg. `userEmail`. Empty for an empty input.
pub fn to_camel_case(snake_case: &str) -> String {
    let capitals_only = !snake_case.chars().any(char::is_lowercase)
        && snake_case.chars().next().is_some_and(char::is_alphabetic);
    let normalized = if snake_case.contains('_') || capitals_only {
        snake_case.to_lowercase()
    } else {
        snake_case.to_string()
    };
    let mut result = String::with_capacity(normalized.len());
    for segment in normalized.split('_').filter(|segment| !segment.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if result.is_empty() {
                result.extend(first.to_lowercase());
            } else {
                result.extend(first.to_uppercase());
            }
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Converts a snake_case identifier to PascalCase.
///
/// ## Parameters:
/// * `snake_case` (`&str`): Identifier to convert, eg. `user_email`.
///
/// ## Returns:
/// * (`String`): PascalCase form, eg. `UserEmail`. Empty for an empty input.
pub fn to_pascal_case(snake_case: &str) -> String {
    let camel_case = to_camel_case(snake_case);
    let mut chars = camel_case.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Converts a camelCase identifier to snake_case.
/// An underscore is inserted at each lowercase to uppercase transition.
///
/// ## Parameters:
/// * `camel_case` (`&str`): Identifier to convert, eg. `userEmail`.
///
/// ## Returns:
/// * (`String`): snake_case form, eg. `user_email`.
pub fn to_snake_case(camel_case: &str) -> String {
    let mut result = String::with_capacity(camel_case.len() + 4);
    let mut previous: Option<char> = None;
    for c in camel_case.chars() {
        if let Some(p) = previous {
            if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
        previous = Some(c);
    }
    result
}

/// true iff the identifier names the column under one of the naming conventions.
///
/// ## Parameters:
/// * `identifier` (`&str`): Field, parameter or annotation value to test,
/// * `column` (`&str`): Column name, usually in snake_case.
///
/// ## Returns:
/// * (`bool`): true iff `identifier` equals the column, its camelCase or its PascalCase form
///   (ignoring case), or if the snake_case form of `identifier` equals the column.
pub fn is_column_match(identifier: &str, column: &str) -> bool {
    identifier.eq_ignore_ascii_case(column)
        || identifier.eq_ignore_ascii_case(&to_camel_case(column))
        || identifier.eq_ignore_ascii_case(&to_pascal_case(column))
        || to_snake_case(identifier).eq_ignore_ascii_case(column)
}

/// true iff the text contains the column under one of the naming conventions, ignoring case.
pub fn contains_column(text: &str, column: &str) -> bool {
    let text = text.to_lowercase();
    [
        column.to_lowercase(),
        to_camel_case(column).to_lowercase(),
        to_pascal_case(column).to_lowercase(),
    ]
    .iter()
    .any(|form| text.contains(form.as_str()))
}

/// true iff a method name embeds the column, eg. `findByUserEmail` for `user_email`.
/// Case sensitive, only the camelCase and PascalCase forms are looked for.
pub fn contains_column_in_method_name(method_name: &str, column: &str) -> bool {
    method_name.contains(&to_camel_case(column)) || method_name.contains(&to_pascal_case(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_snake_case() {
        assert_eq!(to_camel_case("user_email"), "userEmail");
        assert_eq!(to_pascal_case("user_email"), "UserEmail");
        assert_eq!(to_camel_case("USER_EMAIL"), "userEmail");
        assert_eq!(to_camel_case("email"), "email");
        assert_eq!(to_camel_case("userEmail"), "userEmail");
        assert_eq!(to_camel_case("created_at_utc"), "createdAtUtc");
        assert_eq!(to_pascal_case("ID"), "Id");
    }

    #[test]
    fn converts_camel_case() {
        assert_eq!(to_snake_case("userEmail"), "user_email");
        assert_eq!(to_snake_case("UserEmailAddress"), "user_email_address");
        assert_eq!(to_snake_case("email"), "email");
        assert_eq!(to_snake_case("URL"), "url");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_pascal_case(""), "");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn pascal_case_does_not_depend_on_path() {
        for column in ["user_email", "id", "created_at_utc", "a_b", "_leading", "USER_email", ""] {
            assert_eq!(
                to_pascal_case(&to_camel_case(column)),
                to_pascal_case(column),
                "column {column:?}"
            );
        }
    }

    #[test]
    fn matches_identifiers_across_conventions() {
        assert!(is_column_match("user_email", "user_email"));
        assert!(is_column_match("userEmail", "user_email"));
        assert!(is_column_match("UserEmail", "user_email"));
        assert!(is_column_match("USER_EMAIL", "user_email"));
        assert!(!is_column_match("email", "user_email"));
        assert!(!is_column_match("userEmails", "user_email"));
    }

    #[test]
    fn matching_ignores_case_of_both_sides() {
        let pairs = [("userEmail", "user_email"), ("email", "user_email"), ("Id", "id")];
        for (identifier, column) in pairs {
            let expected = is_column_match(identifier, column);
            assert_eq!(is_column_match(&identifier.to_uppercase(), column), expected);
            assert_eq!(is_column_match(&identifier.to_lowercase(), column), expected);
            assert_eq!(is_column_match(identifier, &column.to_uppercase()), expected);
        }
    }

    #[test]
    fn finds_column_in_text() {
        assert!(contains_column("SELECT u.user_email FROM users u", "user_email"));
        assert!(contains_column("return user.getUserEmail();", "user_email"));
        assert!(contains_column("USEREMAIL", "user_email"));
        assert!(!contains_column("return user.getEmail();", "user_email"));
    }

    #[test]
    fn finds_column_in_method_name() {
        assert!(contains_column_in_method_name("findByUserEmail", "user_email"));
        assert!(contains_column_in_method_name("userEmailExists", "user_email"));
        assert!(!contains_column_in_method_name("findByuseremail", "user_email"));
        assert!(!contains_column_in_method_name("findByEmail", "user_email"));
    }

    #[test]
    fn mixed_case_columns_are_normalized() {
        assert_eq!(to_camel_case("USER_email"), "userEmail");
        assert_eq!(to_pascal_case("User_Email"), "UserEmail");
        assert!(contains_column_in_method_name("findByUserEmail", "USER_email"));
        assert_eq!(
            to_pascal_case(&to_camel_case("USER_email")),
            to_pascal_case("USER_email")
        );
    }
}
