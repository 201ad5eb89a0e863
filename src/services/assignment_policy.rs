//! Política de asignación
//!
//! Elige ciudades de origen/destino y conductor cuando no vienen en la
//! solicitud. La fuente de aleatoriedad es una estrategia inyectable para
//! que los tests puedan fijar la elección.

use rand::Rng;
use std::sync::Arc;

use crate::models::City;
use crate::utils::errors::TripError;

/// Estrategia de selección: devuelve un índice en `0..len` (`len > 0`)
pub trait SelectionStrategy: Send + Sync {
    fn pick_index(&self, len: usize) -> usize;
}

/// Selección uniforme
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Siempre el mismo índice (módulo la cantidad de candidatos)
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedSelection(pub usize);

impl SelectionStrategy for FixedSelection {
    fn pick_index(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[derive(Clone)]
pub struct AssignmentPolicy {
    strategy: Arc<dyn SelectionStrategy>,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self::new(Arc::new(RandomSelection))
    }
}

impl AssignmentPolicy {
    pub fn new(strategy: Arc<dyn SelectionStrategy>) -> Self {
        Self { strategy }
    }

    pub fn pick<'a, T>(&self, candidates: &'a [T]) -> Option<&'a T> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.strategy.pick_index(candidates.len()).min(candidates.len() - 1);
        candidates.get(index)
    }

    /// Resuelve el par (origen, destino) sobre las ciudades visibles en la transacción.
    ///
    /// Ids iguales fallan con `InvalidRoute` antes de consultar nada; un id
    /// inexistente falla con `CityNotFound`; si hay que elegir y no quedan al
    /// menos dos ciudades distintas, `InsufficientReferenceData`.
    pub fn resolve_route(
        &self,
        cities: &[City],
        origin: Option<i32>,
        destination: Option<i32>,
    ) -> Result<(City, City), TripError> {
        if let (Some(o), Some(d)) = (origin, destination) {
            if o == d {
                return Err(TripError::InvalidRoute(o));
            }
        }

        let find = |id: i32| {
            cities
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(TripError::CityNotFound(id))
        };

        match (origin, destination) {
            (Some(o), Some(d)) => Ok((find(o)?, find(d)?)),
            (Some(o), None) => {
                let origin = find(o)?;
                let destination = self.pick_other(cities, origin.id)?;
                Ok((origin, destination))
            }
            (None, Some(d)) => {
                let destination = find(d)?;
                let origin = self.pick_other(cities, destination.id)?;
                Ok((origin, destination))
            }
            (None, None) => {
                if cities.len() < 2 {
                    return Err(TripError::InsufficientReferenceData {
                        available: cities.len(),
                    });
                }
                let origin = self
                    .pick(cities)
                    .cloned()
                    .ok_or(TripError::InsufficientReferenceData { available: 0 })?;
                let destination = self.pick_other(cities, origin.id)?;
                Ok((origin, destination))
            }
        }
    }

    fn pick_other(&self, cities: &[City], exclude: i32) -> Result<City, TripError> {
        let rest: Vec<&City> = cities.iter().filter(|c| c.id != exclude).collect();
        self.pick(&rest)
            .map(|c| (*c).clone())
            .ok_or(TripError::InsufficientReferenceData {
                available: cities.len(),
            })
    }
}
