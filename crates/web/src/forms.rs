//! Recipe form parsing and validation.
//!
//! The recipe editor submits ingredient rows and instruction steps as
//! repeated form keys (`ingredient_name`, `ingredient_quantity`, ...).
//! `serde` form deserialization collapses repeated keys, so the raw body is
//! parsed here with `form_urlencoded` instead, keeping positional pairing
//! between the parallel ingredient fields.
//!
//! Validation runs entirely in memory and before any database work: a form
//! that fails validation never opens a connection.

use recetario_core::{Difficulty, Slug};

use crate::db::{IngredientSpec, RecipeWrite};

/// A parsed recipe form, field values still raw.
#[derive(Debug, Clone, Default)]
pub struct RecipeForm {
    pub title: String,
    pub description: String,
    pub prep_time_minutes: Option<i32>,
    pub cooking_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Difficulty,
    pub is_public: bool,
    pub source_url: String,
    pub ingredient_names: Vec<String>,
    pub ingredient_quantities: Vec<String>,
    pub ingredient_units: Vec<String>,
    pub ingredient_notes: Vec<String>,
    pub instructions: Vec<String>,
    pub category_ids: Vec<i64>,
    pub tags: String,
}

/// A validation failure with a message fit for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FormError(pub String);

impl RecipeForm {
    /// Parse a raw `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();

        for (key, value) in url::form_urlencoded::parse(body) {
            let value = value.into_owned();
            match key.as_ref() {
                "title" => form.title = value,
                "description" => form.description = value,
                "prep_time_minutes" => form.prep_time_minutes = parse_minutes(&value),
                "cooking_time_minutes" => form.cooking_time_minutes = parse_minutes(&value),
                "servings" => form.servings = parse_minutes(&value),
                "difficulty" => form.difficulty = Difficulty::from_str_lossy(&value),
                "is_public" => form.is_public = value == "on" || value == "true",
                "source_url" => form.source_url = value,
                "ingredient_name" => form.ingredient_names.push(value),
                "ingredient_quantity" => form.ingredient_quantities.push(value),
                "ingredient_unit" => form.ingredient_units.push(value),
                "ingredient_note" => form.ingredient_notes.push(value),
                "instruction" => form.instructions.push(value),
                "category_id" => {
                    if let Ok(id) = value.parse::<i64>() {
                        form.category_ids.push(id);
                    }
                }
                "tags" => form.tags = value,
                _ => {}
            }
        }

        form
    }

    /// Validate and normalize into a write payload.
    ///
    /// Ingredient rows with an empty name are dropped; blank instruction
    /// lines are dropped and the survivors renumber contiguously from 1 when
    /// stored. The slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns `FormError` when the title is blank, when no ingredient row
    /// has a name, or when the title cannot produce a slug.
    pub fn validate(&self) -> Result<RecipeWrite, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError("A recipe needs a title".to_owned()));
        }

        let ingredients = self.ingredient_specs();
        if ingredients.is_empty() {
            return Err(FormError(
                "A recipe needs at least one ingredient".to_owned(),
            ));
        }

        let slug = Slug::from_title(title)
            .map_err(|_| FormError("The title must contain at least one letter or digit".to_owned()))?;

        let instructions: Vec<String> = self
            .instructions
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(RecipeWrite {
            title: title.to_owned(),
            slug,
            description: non_empty(&self.description),
            image_url: None,
            prep_time_minutes: self.prep_time_minutes,
            cooking_time_minutes: self.cooking_time_minutes,
            servings: self.servings,
            difficulty: self.difficulty,
            is_public: self.is_public,
            source_url: non_empty(&self.source_url),
            ingredients,
            instructions,
            category_ids: self
                .category_ids
                .iter()
                .map(|&id| recetario_core::CategoryId::new(id))
                .collect(),
        })
    }

    /// Comma-separated tag names, trimmed, empty entries dropped.
    #[must_use]
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Pair up the parallel ingredient arrays, dropping rows with no name.
    ///
    /// The arrays can differ in length when a browser omits trailing empty
    /// fields; missing positions read as empty.
    fn ingredient_specs(&self) -> Vec<IngredientSpec> {
        let mut specs = Vec::new();
        for (i, name) in self.ingredient_names.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            specs.push(IngredientSpec {
                name: name.to_owned(),
                quantity: field_at(&self.ingredient_quantities, i),
                unit: field_at(&self.ingredient_units, i),
                note: field_at(&self.ingredient_notes, i),
            });
        }
        specs
    }
}

fn field_at(values: &[String], index: usize) -> Option<String> {
    values.get(index).and_then(|v| non_empty(v))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn parse_minutes(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|&n| n >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in pairs {
            out.append_pair(k, v);
        }
        out.finish().into_bytes()
    }

    #[test]
    fn test_parse_repeated_keys_keep_order() {
        let body = body(&[
            ("title", "Tortilla de patatas"),
            ("ingredient_name", "Patata"),
            ("ingredient_quantity", "4"),
            ("ingredient_unit", "unidad"),
            ("ingredient_name", "Huevo"),
            ("ingredient_quantity", "6"),
            ("ingredient_unit", "unidad"),
            ("instruction", "Pelar las patatas"),
            ("instruction", "Batir los huevos"),
        ]);

        let form = RecipeForm::parse(&body);
        assert_eq!(form.ingredient_names, vec!["Patata", "Huevo"]);
        assert_eq!(form.instructions.len(), 2);
    }

    #[test]
    fn test_validate_requires_title() {
        let form = RecipeForm {
            title: "   ".into(),
            ingredient_names: vec!["Sal".into()],
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_validate_requires_an_ingredient() {
        // Rows exist but every name is blank.
        let form = RecipeForm {
            title: "Agua hervida".into(),
            ingredient_names: vec!["  ".into(), String::new()],
            ingredient_quantities: vec!["1".into(), "2".into()],
            ..Default::default()
        };
        let err = form.validate().unwrap_err();
        assert!(err.0.contains("ingredient"));
    }

    #[test]
    fn test_validate_drops_blank_rows_and_lines() {
        let form = RecipeForm {
            title: "Pan con tomate".into(),
            ingredient_names: vec!["Pan".into(), "".into(), "Tomate".into()],
            ingredient_quantities: vec!["2".into(), "".into(), "1".into()],
            ingredient_units: vec!["rebanada".into()],
            instructions: vec!["Tostar el pan".into(), "  ".into(), "Rallar el tomate".into()],
            ..Default::default()
        };

        let write = form.validate().unwrap();
        assert_eq!(write.ingredients.len(), 2);
        assert_eq!(write.ingredients[0].name, "Pan");
        assert_eq!(write.ingredients[1].name, "Tomate");
        // Second ingredient has no unit because the units array is short.
        assert_eq!(write.ingredients[1].unit, None);
        assert_eq!(write.instructions, vec!["Tostar el pan", "Rallar el tomate"]);
        assert_eq!(write.slug.as_str(), "pan-con-tomate");
    }

    #[test]
    fn test_tag_names() {
        let form = RecipeForm {
            tags: " rápido, vegetariano ,, sin gluten ".into(),
            ..Default::default()
        };
        assert_eq!(form.tag_names(), vec!["rápido", "vegetariano", "sin gluten"]);
    }

    #[test]
    fn test_parse_minutes_rejects_negative() {
        assert_eq!(parse_minutes("30"), Some(30));
        assert_eq!(parse_minutes("-5"), None);
        assert_eq!(parse_minutes("abc"), None);
    }
}
