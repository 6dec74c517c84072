//! Splitting Spanish full names into given name and two surnames

/// A full name divided into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    pub given_name: String,
    pub first_surname: String,
    pub second_surname: String,
}

impl PersonName {
    /// Given name followed by the surnames ("Ana García López")
    pub fn display_name(&self) -> String {
        join_non_empty(&[&self.given_name, &self.first_surname, &self.second_surname])
    }

    /// Surnames first, as rosters list people ("García López Ana")
    pub fn roster_name(&self) -> String {
        join_non_empty(&[&self.first_surname, &self.second_surname, &self.given_name])
    }
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a full name as written on the form
///
/// With a comma the name is read surname-first: `"García López, Ana"`. The
/// part before the comma holds the surnames (first token, then the rest) and
/// the part after it the given name.
///
/// Without a comma the last two words are the surnames and anything before
/// them is the given name. Shorter names fill in from the given name:
/// `"Ana"` is a given name only, `"Ana García"` has a single surname.
///
/// # Examples
/// ```
/// use spanish_text::split_full_name;
/// let name = split_full_name("María José Pérez Sanz");
/// assert_eq!(name.given_name, "María José");
/// assert_eq!(name.first_surname, "Pérez");
/// assert_eq!(name.second_surname, "Sanz");
/// ```
pub fn split_full_name(full_name: &str) -> PersonName {
    if let Some((surnames, given)) = full_name.split_once(',') {
        let mut tokens = surnames.split_whitespace();
        let first_surname = tokens.next().unwrap_or_default().to_string();
        let second_surname = tokens.collect::<Vec<_>>().join(" ");
        return PersonName {
            given_name: given.split_whitespace().collect::<Vec<_>>().join(" "),
            first_surname,
            second_surname,
        };
    }

    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => PersonName::default(),
        [given] => PersonName {
            given_name: given.to_string(),
            ..Default::default()
        },
        [given, surname] => PersonName {
            given_name: given.to_string(),
            first_surname: surname.to_string(),
            second_surname: String::new(),
        },
        [given @ .., first, second] => PersonName {
            given_name: given.join(" "),
            first_surname: first.to_string(),
            second_surname: second.to_string(),
        },
    }
}
