use crate::models::{IngredientRequirement, Macros};
use crate::units::UnitDomain;

/// Share of the mass-equivalent assumed to be protein.
pub const PROTEIN_SHARE: f64 = 0.25;
/// Share of the mass-equivalent assumed to be fat; carbohydrate takes the rest.
pub const FAT_SHARE: f64 = 0.08;

/// Atwater factors, kcal per gram.
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Per-field floor used in the divergence denominator, so near-zero fields
/// cannot blow the ratio up.
const DIVERGENCE_FIELD_FLOOR: f64 = 1.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Total "mass-equivalent" of a candidate's requirements: grams as is,
/// millilitres at 1 g/ml and counts at `count_mass_g` each.
pub fn mass_equivalent(requirements: &[IngredientRequirement], count_mass_g: f64) -> f64 {
    requirements
        .iter()
        .filter_map(IngredientRequirement::needed)
        .map(|needed| match needed.domain {
            UnitDomain::Grams | UnitDomain::Milliliters => needed.value,
            UnitDomain::Count => needed.value * count_mass_g,
        })
        .sum()
}

/// Heuristic per-serving macros from ingredient totals.
///
/// # Arguments
/// * `requirements`: the candidate's ingredient requirements.
/// * `servings`: servings the totals are split across (zero is treated as one).
/// * `count_mass_g`: grams assumed per counted unit.
///
/// # Returns
/// Macros rounded to one decimal place.
pub fn estimate_macros(requirements: &[IngredientRequirement], servings: u32, count_mass_g: f64) -> Macros {
    let per_serving = mass_equivalent(requirements, count_mass_g) / servings.max(1) as f64;
    let protein = per_serving * PROTEIN_SHARE;
    let fat = per_serving * FAT_SHARE;
    let carb = per_serving - protein - fat;
    let kcal = protein * KCAL_PER_G_PROTEIN + carb * KCAL_PER_G_CARB + fat * KCAL_PER_G_FAT;

    Macros {
        kcal: Some(round1(kcal)),
        protein_g: Some(round1(protein)),
        carb_g: Some(round1(carb)),
        fat_g: Some(round1(fat)),
    }
}

/// Normalized divergence between two macro profiles: the sum of absolute
/// per-field differences over the sum of per-field maxima, each maximum
/// floored at 1.0. Missing fields count as zero.
pub fn macro_divergence(stated: &Macros, estimated: &Macros) -> f64 {
    let pairs = [
        (stated.kcal, estimated.kcal),
        (stated.protein_g, estimated.protein_g),
        (stated.carb_g, estimated.carb_g),
        (stated.fat_g, estimated.fat_g),
    ];

    let mut difference = 0.0;
    let mut scale = 0.0;
    for (a, b) in pairs {
        let a = a.unwrap_or(0.0);
        let b = b.unwrap_or(0.0);
        difference += (a - b).abs();
        scale += a.max(b).max(DIVERGENCE_FIELD_FLOOR);
    }
    difference / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Measure;

    fn requirement(needed: Measure) -> IngredientRequirement {
        IngredientRequirement::new(None, "x", needed)
    }

    #[test]
    fn test_estimate_from_mixed_units() {
        let requirements = vec![
            requirement(Measure::grams(600.0)),
            requirement(Measure::milliliters(250.0)),
            requirement(Measure::count(2.0)),
        ];
        assert_eq!(mass_equivalent(&requirements, 75.0), 1000.0);

        let macros = estimate_macros(&requirements, 2, 75.0);
        assert_eq!(macros.protein_g, Some(125.0));
        assert_eq!(macros.fat_g, Some(40.0));
        assert_eq!(macros.carb_g, Some(335.0));
        assert_eq!(macros.kcal, Some(2200.0));
    }

    #[test]
    fn test_zero_servings_treated_as_one() {
        let requirements = vec![requirement(Measure::grams(100.0))];
        let macros = estimate_macros(&requirements, 0, 75.0);
        assert_eq!(macros.protein_g, Some(25.0));
        assert_eq!(macros.fat_g, Some(8.0));
        assert_eq!(macros.carb_g, Some(67.0));
    }

    #[test]
    fn test_divergence_identical_is_zero() {
        let macros = Macros { kcal: Some(500.0), protein_g: Some(30.0), carb_g: Some(50.0), fat_g: Some(20.0) };
        assert_eq!(macro_divergence(&macros, &macros), 0.0);
    }

    #[test]
    fn test_divergence_floors_small_fields() {
        let stated = Macros { kcal: Some(0.0), protein_g: Some(0.0), carb_g: Some(0.0), fat_g: Some(0.0) };
        let estimated = Macros { kcal: Some(0.5), protein_g: Some(0.0), carb_g: Some(0.0), fat_g: Some(0.0) };
        // 0.5 / (1 + 1 + 1 + 1)
        assert_eq!(macro_divergence(&stated, &estimated), 0.125);
    }

    #[test]
    fn test_divergence_treats_missing_fields_as_zero() {
        let stated = Macros { kcal: Some(100.0), ..Default::default() };
        let estimated = Macros { kcal: Some(100.0), protein_g: Some(10.0), carb_g: Some(10.0), fat_g: Some(5.0) };
        // 25 / (100 + 10 + 10 + 5)
        assert_eq!(macro_divergence(&stated, &estimated), 0.2);
    }
}
