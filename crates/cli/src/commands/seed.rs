//! Seed the database with demo content.
//!
//! Creates a demo account and a handful of public recipes through the
//! same atomic write path the web server uses, so the seeded data obeys
//! every constraint real submissions do. Running it twice is safe: an
//! existing demo account short-circuits the whole command.

use tracing::info;

use recetario_core::{Difficulty, Slug};
use recetario_web::db::{
    self, IngredientSpec, RecipeRepository, RecipeWrite, TaxonomyRepository,
};
use recetario_web::services::{AuthError, AuthService};

/// Seed a demo account and demo recipes.
///
/// # Errors
///
/// Returns an error if the environment is missing the database URL, the
/// connection fails, or any insert fails.
pub async fn run(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let auth = AuthService::new(&pool);
    let user = match auth.create_account(email, password, "Demo Chef").await {
        Ok(user) => user,
        Err(AuthError::UserAlreadyExists) => {
            info!(email, "Demo account already exists, nothing to do");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "Created demo account");

    let recipes = RecipeRepository::new(&pool);
    let taxonomy = TaxonomyRepository::new(&pool);

    for (write, tag_names) in demo_recipes(&taxonomy).await? {
        let id = recipes.create_atomic(user.id, &write).await?;

        let mut tag_ids = Vec::with_capacity(tag_names.len());
        for name in &tag_names {
            tag_ids.push(taxonomy.upsert_tag(name).await?);
        }
        taxonomy.set_recipe_tags(id, &tag_ids).await?;

        info!(recipe_id = %id, title = %write.title, "Seeded recipe");
    }

    info!("Seeding complete!");
    Ok(())
}

async fn demo_recipes(
    taxonomy: &TaxonomyRepository<'_>,
) -> Result<Vec<(RecipeWrite, Vec<String>)>, Box<dyn std::error::Error>> {
    let dinner = category_ids(taxonomy, &["dinner"]).await?;
    let breakfast = category_ids(taxonomy, &["breakfast", "vegetarian"]).await?;
    let dessert = category_ids(taxonomy, &["dessert", "baking"]).await?;

    Ok(vec![
        (
            RecipeWrite {
                title: "Pan con tomate".to_owned(),
                slug: slug("Pan con tomate")?,
                description: Some(
                    "Toasted bread rubbed with ripe tomato, garlic and olive oil.".to_owned(),
                ),
                image_url: None,
                prep_time_minutes: Some(10),
                cooking_time_minutes: Some(5),
                servings: Some(2),
                difficulty: Difficulty::Easy,
                is_public: true,
                source_url: None,
                ingredients: vec![
                    ingredient("Bread", "4", "slices", None),
                    ingredient("Tomato", "2", "", Some("very ripe")),
                    ingredient("Garlic", "1", "clove", None),
                    ingredient("Olive oil", "2", "tbsp", None),
                    ingredient("Salt", "1", "pinch", None),
                ],
                instructions: vec![
                    "Toast the bread until golden.".to_owned(),
                    "Rub each slice with the cut garlic clove.".to_owned(),
                    "Halve the tomatoes and rub them over the bread.".to_owned(),
                    "Drizzle with olive oil and season with salt.".to_owned(),
                ],
                category_ids: breakfast,
            },
            vec!["spanish".to_owned(), "quick".to_owned()],
        ),
        (
            RecipeWrite {
                title: "Lentil stew".to_owned(),
                slug: slug("Lentil stew")?,
                description: Some("A slow-simmered weeknight stew with smoked paprika.".to_owned()),
                image_url: None,
                prep_time_minutes: Some(15),
                cooking_time_minutes: Some(45),
                servings: Some(4),
                difficulty: Difficulty::Medium,
                is_public: true,
                source_url: None,
                ingredients: vec![
                    ingredient("Brown lentils", "300", "g", Some("rinsed")),
                    ingredient("Onion", "1", "", Some("diced")),
                    ingredient("Carrot", "2", "", Some("diced")),
                    ingredient("Garlic", "2", "cloves", None),
                    ingredient("Smoked paprika", "1", "tsp", None),
                    ingredient("Olive oil", "2", "tbsp", None),
                ],
                instructions: vec![
                    "Soften the onion, carrot and garlic in olive oil.".to_owned(),
                    "Stir in the paprika and cook for one minute.".to_owned(),
                    "Add the lentils and a litre of water.".to_owned(),
                    "Simmer for 45 minutes, seasoning at the end.".to_owned(),
                ],
                category_ids: dinner,
            },
            vec!["stew".to_owned(), "weeknight".to_owned()],
        ),
        (
            RecipeWrite {
                title: "Flan de huevo".to_owned(),
                slug: slug("Flan de huevo")?,
                description: Some("Classic caramel custard, baked in a water bath.".to_owned()),
                image_url: None,
                prep_time_minutes: Some(20),
                cooking_time_minutes: Some(50),
                servings: Some(6),
                difficulty: Difficulty::Hard,
                is_public: true,
                source_url: None,
                ingredients: vec![
                    ingredient("Eggs", "4", "", None),
                    ingredient("Milk", "500", "ml", Some("whole")),
                    ingredient("Sugar", "150", "g", Some("plus more for the caramel")),
                    ingredient("Vanilla", "1", "tsp", None),
                ],
                instructions: vec![
                    "Melt sugar into a dark caramel and coat the moulds.".to_owned(),
                    "Whisk the eggs with milk, sugar and vanilla.".to_owned(),
                    "Strain into the moulds and bake in a water bath.".to_owned(),
                    "Chill overnight before unmoulding.".to_owned(),
                ],
                category_ids: dessert,
            },
            vec!["custard".to_owned(), "make-ahead".to_owned()],
        ),
    ])
}

async fn category_ids(
    taxonomy: &TaxonomyRepository<'_>,
    slugs: &[&str],
) -> Result<Vec<recetario_core::CategoryId>, Box<dyn std::error::Error>> {
    let mut ids = Vec::with_capacity(slugs.len());
    for name in slugs {
        let category = taxonomy
            .category_by_slug(&Slug::parse(name)?)
            .await?
            .ok_or_else(|| format!("missing seed category: {name}"))?;
        ids.push(category.id);
    }
    Ok(ids)
}

fn slug(title: &str) -> Result<Slug, Box<dyn std::error::Error>> {
    Slug::from_title(title).map_err(|e| format!("bad demo title {title:?}: {e}").into())
}

fn ingredient(name: &str, quantity: &str, unit: &str, note: Option<&str>) -> IngredientSpec {
    IngredientSpec {
        name: name.to_owned(),
        quantity: Some(quantity.to_owned()).filter(|q| !q.is_empty()),
        unit: Some(unit.to_owned()).filter(|u| !u.is_empty()),
        note: note.map(ToOwned::to_owned),
    }
}
