//! Shared nutrition data structure
//!
//! The four-slot macro vector used for per-100g reference values,
//! per-ingredient contributions, and recipe totals.

use serde::{Deserialize, Serialize};

/// Macro nutrients: energy (kcal), protein, fat, carbohydrate (grams)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Nutrition {
    pub fn new(calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            calories,
            protein,
            fat,
            carbs,
        }
    }

    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Values in reference-table order: energy, protein, fat, carbohydrate
    pub fn to_array(&self) -> [f64; 4] {
        [self.calories, self.protein, self.fat, self.carbs]
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn is_zero(&self) -> bool {
        self.to_array().iter().all(|v| *v == 0.0)
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            fat: self.fat * multiplier,
            carbs: self.carbs * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            carbs: self.carbs + other.carbs,
        }
    }

    /// Apply `f` to every slot
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::from_array(self.to_array().map(f))
    }

    /// Round every slot to two decimals, the precision stored for recipes
    pub fn rounded(&self) -> Self {
        self.map(|v| (v * 100.0).round() / 100.0)
    }

    /// Slot-wise comparison within an absolute tolerance.
    ///
    /// Sums are not bit-stable across orderings, so totals are compared this way.
    pub fn approx_eq(&self, other: &Nutrition, tolerance: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

impl From<[f64; 4]> for Nutrition {
    fn from(values: [f64; 4]) -> Self {
        Self::from_array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_add() {
        let a = Nutrition::new(100.0, 10.0, 5.0, 20.0);
        let b = a * 0.5 + a;
        assert!(b.approx_eq(&Nutrition::new(150.0, 15.0, 7.5, 30.0), 1e-9));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Nutrition = Vec::<Nutrition>::new().into_iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_rounded() {
        let n = Nutrition::new(1.234, 2.345, 0.0049, 10.0).rounded();
        assert_eq!(n.calories, 1.23);
        assert_eq!(n.fat, 0.0);
        assert_eq!(n.carbs, 10.0);
    }

    #[test]
    fn test_array_order() {
        let n: Nutrition = [1.0, 2.0, 3.0, 4.0].into();
        assert_eq!(n.protein, 2.0);
        assert_eq!(n.fat, 3.0);
        assert_eq!(n.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }
}
