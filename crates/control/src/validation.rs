use airport_models::{AirportError, FieldErrors, NON_FIELD_ERRORS};

pub const BLANK: &str = "This field may not be blank.";
pub const EMPTY_LIST: &str = "This list may not be empty.";
pub const SAME_ENDPOINTS: &str = "Source and destination airports must be different.";
pub const DEPARTURE_AFTER_ARRIVAL: &str = "Departure time must be earlier than arrival time.";

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

pub fn too_short(min: usize) -> String {
    format!("Ensure this field has at least {min} characters.")
}

pub fn below_minimum(min: i64) -> String {
    format!("Ensure this value is greater than or equal to {min}.")
}

pub fn missing_pk(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// `row number must be in available range:(1, rows): (1, 10)`
pub fn out_of_range(attr: &str, airplane_attr: &str, max: i32) -> String {
    format!("{attr} number must be in available range:(1, {airplane_attr}): (1, {max})")
}

/// Accumulates field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn non_field(&mut self, message: impl Into<String>) -> &mut Self {
        self.add(NON_FIELD_ERRORS, message)
    }

    /// Required text: not blank and at most `max` characters once trimmed.
    pub fn text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, BLANK);
        } else if value.chars().count() > max {
            self.add(field, too_long(max));
        }
        self
    }

    pub fn min_value(&mut self, field: &str, value: i64, min: i64) -> &mut Self {
        if value < min {
            self.add(field, below_minimum(min));
        }
        self
    }

    /// Record a dangling foreign key unless `exists`.
    pub fn reference(&mut self, field: &str, id: i64, exists: bool) -> &mut Self {
        if !exists {
            self.add(field, missing_pk(id));
        }
        self
    }

    /// Adopt the errors of the `index`-th element of a nested list as
    /// `{field}.{index}.{nested field}`.
    pub fn nested(&mut self, field: &str, index: usize, nested: FieldErrors) -> &mut Self {
        for (name, messages) in nested {
            let key = format!("{field}.{index}.{name}");
            self.errors.entry(key).or_default().extend(messages);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    pub fn finish(self) -> Result<(), AirportError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AirportError::Validation(self.errors))
        }
    }
}
