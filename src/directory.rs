//! The car directory: cars indexed by brand and by production start year.

use alloc::string::String;
use core::fmt;

use log::{debug, warn};

use crate::{
    errors::DirectoryError,
    pair_index::PairIndex,
    rb_tree::{RbTree, RowSink},
};

/// One directory record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Car {
    /// Manufacturer name, the key of the brand index
    pub brand: String,
    /// Model name within the brand
    pub model: String,
    /// First production year
    pub start: u16,
    /// Last production year, `None` while still in production
    pub end: Option<u16>,
}

impl Car {
    /// Creates a record, `end == None` meaning still in production
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        start: u16,
        end: Option<u16>,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            start,
            end,
        }
    }

    /// Returns true if both records claim production in the same span.
    ///
    /// Adjacent generations may share their boundary year; two generations
    /// starting in the same year always overlap.
    fn overlaps(&self, other: &Car) -> bool {
        let end = self.end.unwrap_or(u16::MAX);
        let other_end = other.end.unwrap_or(u16::MAX);
        self.start == other.start || (self.start < other_end && other.start < end)
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} {} ({}-{})", self.brand, self.model, self.start, end),
            None => write!(f, "{} {} ({}-present)", self.brand, self.model, self.start),
        }
    }
}

/// Accepted production-year window for new records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Earliest accepted production year
    pub min_year: u16,
    /// Latest accepted production year
    pub max_year: u16,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            min_year: 1968,
            max_year: 2021,
        }
    }
}

impl DirectoryConfig {
    /// Replaces the accepted year window, bounds inclusive
    pub const fn with_year_range(mut self, min_year: u16, max_year: u16) -> Self {
        self.min_year = min_year;
        self.max_year = max_year;
        self
    }

    fn check_year(&self, year: u16) -> Result<(), DirectoryError> {
        if !(self.min_year..=self.max_year).contains(&year) {
            return Err(DirectoryError::YearOutOfRange {
                year,
                min: self.min_year,
                max: self.max_year,
            });
        }
        Ok(())
    }
}

/// Cars indexed by brand and by production start year.
///
/// Both indexes are [`RbTree`] multi-maps holding their own copy of each
/// record; a [`PairIndex`] tracks which brand+model pairs are listed.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    config: DirectoryConfig,
    by_brand: RbTree<String, Car>,
    by_year: RbTree<u16, Car>,
    pairs: PairIndex,
}

impl Directory {
    /// Creates an empty directory with the default year window
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty directory accepting the years in `config`
    pub fn with_config(config: DirectoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The year window new records are checked against
    #[inline]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Number of cars listed
    #[inline]
    pub fn len(&self) -> usize {
        self.by_brand.total_values()
    }

    /// Returns true if no car is listed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_brand.is_empty()
    }

    /// Number of distinct brands listed
    #[inline]
    pub fn brand_count(&self) -> usize {
        self.by_brand.len()
    }

    /// Lists a car in both indexes.
    ///
    /// # Errors
    ///
    /// * `YearOutOfRange` - a production year is outside the configured window
    /// * `EndBeforeStart` - production ends before it starts
    /// * `Duplicate` - the identical car is already listed
    /// * `OverlappingGeneration` - another generation of the same brand and
    ///   model was in production during the same years
    pub fn insert(&mut self, car: Car) -> Result<(), DirectoryError> {
        self.check_years(&car)?;

        if self.by_brand.contains(car.brand.as_str(), &car) {
            warn!("rejected duplicate car {car}");
            return Err(DirectoryError::Duplicate);
        }
        self.check_generations(&car)?;

        self.pairs.insert(&car.brand, &car.model);
        self.by_year.insert(car.start, car.clone());
        self.by_brand.insert(car.brand.clone(), car);
        debug!("directory now lists {} cars", self.len());
        Ok(())
    }

    /// Removes one car from both indexes
    ///
    /// # Returns
    ///
    /// * `bool` - True if the car was listed
    pub fn remove(&mut self, car: &Car) -> bool {
        if !self.by_brand.remove(car.brand.as_str(), car) {
            return false;
        }
        self.by_year.remove(&car.start, car);
        self.pairs.remove(&car.brand, &car.model);
        debug!("removed car {car}");
        true
    }

    /// Removes a brand and every car listed under it
    ///
    /// # Returns
    ///
    /// * `usize` - The number of cars removed
    pub fn remove_brand(&mut self, brand: &str) -> usize {
        let Some(cars) = self.by_brand.remove_key(brand) else {
            return 0;
        };
        for car in &cars {
            self.by_year.remove(&car.start, car);
            self.pairs.remove(&car.brand, &car.model);
        }
        debug!("removed brand {brand} with {} cars", cars.len());
        cars.len()
    }

    /// Cars of `brand` in the order they were listed, with the number of tree
    /// nodes visited to find them
    pub fn find_brand(&self, brand: &str) -> (&[Car], usize) {
        self.by_brand.get_values_counted(brand)
    }

    /// The first listed car of `brand` and `model`, with the number of
    /// comparisons spent: one per tree node visited, plus one per car of the
    /// brand scanned.
    pub fn find_model(&self, brand: &str, model: &str) -> (Option<&Car>, usize) {
        let (cars, mut comparisons) = self.by_brand.get_values_counted(brand);
        for car in cars {
            comparisons += 1;
            if car.model == model {
                return (Some(car), comparisons);
            }
        }
        (None, comparisons)
    }

    /// Cars whose production started in `year`
    pub fn cars_started_in(&self, year: u16) -> &[Car] {
        self.by_year.get_values(&year)
    }

    /// Returns true if any car of this brand and model is listed
    pub fn contains_model(&self, brand: &str, model: &str) -> bool {
        self.pairs.contains(brand, model)
    }

    /// Returns true if at least one car of `brand` is listed
    pub fn contains_brand(&self, brand: &str) -> bool {
        self.by_brand.contains_key(brand)
    }

    /// Returns true if this exact car is listed
    pub fn contains(&self, car: &Car) -> bool {
        self.by_brand.contains(car.brand.as_str(), car)
    }

    /// Brands in ascending order
    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.by_brand.iter().map(|node| node.key().as_str())
    }

    /// Writes every car into `sink`, brands ascending
    pub fn write_report<S: RowSink<String, Car> + ?Sized>(&self, sink: &mut S) {
        self.by_brand.write_rows(sink);
    }

    /// Drops every listed car
    pub fn clear(&mut self) {
        self.by_brand.clear();
        self.by_year.clear();
        self.pairs.clear();
    }

    fn check_years(&self, car: &Car) -> Result<(), DirectoryError> {
        let checked = self.config.check_year(car.start).and_then(|()| match car.end {
            Some(end) if end < car.start => Err(DirectoryError::EndBeforeStart {
                start: car.start,
                end,
            }),
            Some(end) => self.config.check_year(end),
            None => Ok(()),
        });
        if let Err(err) = &checked {
            warn!("rejected car {car}: {err}");
        }
        checked
    }

    fn check_generations(&self, car: &Car) -> Result<(), DirectoryError> {
        if !self.pairs.contains(&car.brand, &car.model) {
            return Ok(());
        }
        let clash = self
            .by_brand
            .get_values(car.brand.as_str())
            .iter()
            .find(|listed| listed.model == car.model && listed.overlaps(car));
        match clash {
            Some(listed) => {
                warn!("rejected car {car}: overlaps {listed}");
                Err(DirectoryError::OverlappingGeneration {
                    start: listed.start,
                })
            }
            None => Ok(()),
        }
    }
}
