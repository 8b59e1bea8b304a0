#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use bc_council::{LocationDto, ScheduleProvider};
use bc_domain::day::start_of_day;
use bc_domain::error::{Error, Result};
use bc_domain::{Category, CollectionEvent, DeviceAddress};

pub const TZ: chrono_tz::Tz = chrono_tz::Europe::London;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 15, 0).unwrap()
}

pub fn midnight() -> DateTime<Utc> {
    start_of_day(now(), TZ)
}

pub fn event(days_from_today: i64, cats: &[Category]) -> CollectionEvent {
    CollectionEvent::new(midnight() + Duration::days(days_from_today), cats.to_vec(), false).unwrap()
}

pub fn address(line: &str, postcode: &str) -> DeviceAddress {
    DeviceAddress {
        address_line1: Some(line.into()),
        postal_code: Some(postcode.into()),
        country_code: Some("GB".into()),
    }
}

pub fn location(id: &str, house: &str) -> LocationDto {
    LocationDto {
        id: id.into(),
        house_number: Some(house.into()),
        street: None,
        town: None,
        postcode: None,
    }
}

/// What a fake location answers with.
#[derive(Clone)]
pub enum Probe {
    Events(Vec<CollectionEvent>),
    Fail(fn(String) -> Error),
    Hang,
}

/// In-memory stand-in for the council API.
#[derive(Default)]
pub struct FakeCouncil {
    pub postcodes: HashMap<String, Vec<LocationDto>>,
    pub locations: HashMap<String, Probe>,
    pub searches: AtomicUsize,
    pub probed: Mutex<Vec<String>>,
}

impl FakeCouncil {
    pub fn with_postcode(mut self, postcode: &str, locations: Vec<LocationDto>) -> Self {
        self.postcodes.insert(postcode.into(), locations);
        self
    }

    pub fn with_location(mut self, id: &str, probe: Probe) -> Self {
        self.locations.insert(id.into(), probe);
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> Vec<String> {
        let mut p = self.probed.lock().clone();
        p.sort();
        p
    }
}

#[async_trait]
impl ScheduleProvider for FakeCouncil {
    async fn search_locations(&self, postcode: &str) -> Result<Vec<LocationDto>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.postcodes.get(postcode).cloned().unwrap_or_default())
    }

    async fn collections_for(&self, location_id: &str, _count: u32) -> Result<Vec<CollectionEvent>> {
        self.probed.lock().push(location_id.to_owned());
        match self.locations.get(location_id).cloned() {
            None => Ok(vec![]),
            Some(Probe::Events(events)) => Ok(events),
            Some(Probe::Fail(make)) => Err(make(location_id.to_owned())),
            Some(Probe::Hang) => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(vec![])
            }
        }
    }
}
