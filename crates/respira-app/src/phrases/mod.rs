//! Motivational phrase selection
//!
//! A constant catalog of Spanish phrases grouped by category, plus a
//! pure selector: given the caller's mood state and a random source it
//! returns a pick and the updated state. Nothing here reads or writes
//! global state — persisting `MoodState` is the caller's business.

use crate::config::phrases::RECENT_WINDOW;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrase categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Calma,
    Animo,
    Fuerza,
    Gratitud,
    Esperanza,
}

impl Category {
    /// All categories, in rotation order
    pub const ALL: [Category; 5] = [
        Category::Calma,
        Category::Animo,
        Category::Fuerza,
        Category::Gratitud,
        Category::Esperanza,
    ];

    /// Machine-readable name (matches the serde form)
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Calma => "calma",
            Category::Animo => "animo",
            Category::Fuerza => "fuerza",
            Category::Gratitud => "gratitud",
            Category::Esperanza => "esperanza",
        }
    }

    /// Parse a category name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a free-form mood onto a category
pub fn category_for_mood(mood: &str) -> Option<Category> {
    match mood.trim().to_lowercase().as_str() {
        "ansiedad" | "ansioso" | "ansiosa" | "estres" | "estrés" | "nervios" => {
            Some(Category::Calma)
        }
        "tristeza" | "triste" | "desanimo" | "desánimo" => Some(Category::Animo),
        "cansancio" | "cansado" | "cansada" | "agotamiento" => Some(Category::Fuerza),
        "gratitud" | "agradecido" | "agradecida" => Some(Category::Gratitud),
        "miedo" | "duda" | "incertidumbre" => Some(Category::Esperanza),
        _ => None,
    }
}

const CALMA: &[&str] = &[
    "Respira hondo, estás a salvo.",
    "Este momento también pasará.",
    "Suelta lo que no puedes controlar.",
    "La calma ya vive en ti.",
    "Un pensamiento a la vez.",
    "Tu respiración es tu ancla.",
    "No hay prisa, solo presencia.",
    "Deja que el aire haga su trabajo.",
    "Aquí y ahora es suficiente.",
    "El silencio también es descanso.",
];

const ANIMO: &[&str] = &[
    "Cree en ti y todo será posible.",
    "Hoy es un buen día para empezar de nuevo.",
    "Cada pequeño paso cuenta.",
    "Lo estás haciendo mejor de lo que crees.",
    "Mereces la misma amabilidad que das.",
    "Levantarse también es avanzar.",
    "Tu esfuerzo de hoy es la raíz de mañana.",
    "Nada florece todo el año; tú tampoco tienes que hacerlo.",
    "Eres más fuerte que tus dudas.",
    "Las nubes pasan, el cielo queda.",
];

const FUERZA: &[&str] = &[
    "Has superado todos tus días difíciles hasta ahora.",
    "Descansar no es rendirse.",
    "Tu constancia vale más que la perfección.",
    "Paso corto, mirada larga.",
    "La fuerza también se entrena respirando.",
    "Puedes con este minuto, y luego con el siguiente.",
    "Lo difícil de hoy es la historia de mañana.",
    "No estás empezando de cero, estás empezando con experiencia.",
    "Cada cicatriz es una lección aprendida.",
    "Sigue: el camino se hace andando.",
];

const GRATITUD: &[&str] = &[
    "Hoy hay algo pequeño que agradecer.",
    "Lo que das, te acompaña.",
    "Agradecer también es respirar hondo.",
    "Mira lo que sí tienes.",
    "Cada día trae un regalo discreto.",
    "La gratitud convierte lo suficiente en bastante.",
    "Gracias también por los comienzos torpes.",
    "Quien agradece, descansa.",
    "Hay belleza en lo cotidiano.",
    "Celebra lo que ya caminaste.",
];

const ESPERANZA: &[&str] = &[
    "Mañana puede ser distinto.",
    "Las puertas se abren caminando.",
    "Aún no conoces tus mejores días.",
    "La semilla no ve la flor, y aun así crece.",
    "Confía en el proceso.",
    "Después de la tormenta, la tierra queda lista.",
    "Todo lo vivo vuelve a intentarlo.",
    "Tu historia no ha terminado.",
    "Donde hay respiración, hay posibilidad.",
    "Un amanecer a la vez.",
];

/// Catalog for a category
pub fn phrases_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Calma => CALMA,
        Category::Animo => ANIMO,
        Category::Fuerza => FUERZA,
        Category::Gratitud => GRATITUD,
        Category::Esperanza => ESPERANZA,
    }
}

/// Caller-owned selection state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    /// Free-form mood, mapped onto a category when no explicit one is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,

    /// Explicit category preference; wins over the mood mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// Recently shown phrases, newest first, bounded
    #[serde(default)]
    pub recent: Vec<String>,

    /// Rotation cursor used when neither category nor mood decides
    #[serde(default)]
    pub rotation: usize,
}

/// A pick plus the state to carry forward
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub category: Category,
    pub phrase: String,
    pub updated: MoodState,
}

/// Pick a phrase for the given state.
///
/// Category resolution: explicit category, then mood mapping, then
/// plain rotation through all categories. The pick avoids the recent
/// window when the catalog allows it and is recorded in the returned
/// state; the input state is left untouched.
pub fn select_and_mark<R: Rng>(state: &MoodState, rng: &mut R) -> Selection {
    let mut updated = state.clone();

    let category = state
        .category
        .or_else(|| state.mood.as_deref().and_then(category_for_mood))
        .unwrap_or_else(|| {
            let c = Category::ALL[state.rotation % Category::ALL.len()];
            updated.rotation = state.rotation.wrapping_add(1);
            c
        });

    let catalog = phrases_for(category);
    let fresh: Vec<&'static str> = catalog
        .iter()
        .copied()
        .filter(|p| !state.recent.iter().any(|r| r == p))
        .collect();
    let pool: &[&'static str] = if fresh.is_empty() { catalog } else { &fresh };
    let phrase = pool[rng.random_range(0..pool.len())].to_string();

    updated.recent.insert(0, phrase.clone());
    updated.recent.truncate(RECENT_WINDOW);

    Selection {
        category,
        phrase,
        updated,
    }
}
