mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use bc_domain::error::{Error, Result};
use bc_domain::{Category, DeviceAddress, DeviceIdentity, PostcodeLookup};
use bc_sessions::{next_event_at, DeviceGateway, ProgressTarget, RefreshPipeline, StaticDevice};

use common::{address, event, location, now, FakeCouncil, Probe, TZ};

fn pipeline(council: Arc<FakeCouncil>) -> RefreshPipeline {
    RefreshPipeline::new(council, 12, 3, Duration::from_millis(200))
}

fn identity() -> DeviceIdentity {
    DeviceIdentity::from_address("kitchen", &address("42 Mill Lane", "TE5 7PC")).unwrap()
}

#[tokio::test]
async fn builds_state_for_matched_building() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode(
                "TE57PC",
                vec![location("L1", "40"), location("L2", "42"), location("L3", "44")],
            )
            .with_location(
                "L2",
                Probe::Events(vec![
                    event(1, &[Category::Domestic]),
                    event(8, &[Category::Recycle]),
                ]),
            ),
    );

    let state = pipeline(council.clone())
        .refresh(&identity(), None, None, now())
        .await
        .unwrap();

    assert_eq!(state.collections.len(), 2);
    assert_eq!(state.fetched_at, Some(now()));
    assert_eq!(state.last_reported, chrono::DateTime::UNIX_EPOCH);
    assert!(state.dirty);
    assert_eq!(state.device, Some(identity()));

    let lookup = state.postcode_cache.as_ref().unwrap();
    assert_eq!(lookup.location_ids, vec!["L2", "L1", "L3"]);

    let next = next_event_at(&state, None, now(), TZ).unwrap();
    assert_eq!(next.primary_category(), Category::Domestic);
}

#[tokio::test]
async fn first_success_by_candidate_order_wins() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode(
                "TE57PC",
                vec![
                    location("A", "1"),
                    location("B", "3"),
                    location("C", "5"),
                    location("D", "7"),
                ],
            )
            .with_location("A", Probe::Events(vec![]))
            .with_location("B", Probe::Fail(Error::Http))
            .with_location(
                "C",
                Probe::Events(vec![
                    event(2, &[Category::Organic]),
                    event(9, &[Category::Domestic, Category::Food]),
                ]),
            )
            .with_location("D", Probe::Events(vec![event(3, &[Category::Recycle])])),
    );

    let state = pipeline(council.clone())
        .refresh(&identity(), None, None, now())
        .await
        .unwrap();

    assert_eq!(council.probed(), vec!["A", "B", "C"]);
    let cats: Vec<_> = state.collections.iter().map(|e| e.primary_category()).collect();
    assert_eq!(cats, vec![Category::Organic, Category::Domestic]);
}

#[tokio::test]
async fn empty_postcode_search_is_location_not_found() {
    let council = Arc::new(FakeCouncil::default());
    let err = pipeline(council)
        .refresh(&identity(), None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LocationNotFound(ref outward) if outward == "TE5"));
}

#[tokio::test]
async fn all_probes_failing_is_upstream_unavailable() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("A", "1"), location("B", "2")])
            .with_location("A", Probe::Fail(Error::Http))
            .with_location("B", Probe::Hang),
    );
    let err = pipeline(council)
        .refresh(&identity(), None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn bad_upstream_data_is_not_skipped() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("A", "1"), location("B", "2")])
            .with_location("A", Probe::Fail(Error::UnknownCategory))
            .with_location("B", Probe::Events(vec![event(1, &[Category::Domestic])])),
    );
    let err = pipeline(council)
        .refresh(&identity(), None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCategory(_)));
}

#[tokio::test]
async fn valid_lookup_skips_postcode_search() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("L2", "42")])
            .with_location("L2", Probe::Events(vec![event(1, &[Category::Domestic])])),
    );
    let p = pipeline(council.clone());

    let first = p.refresh(&identity(), None, None, now()).await.unwrap();
    assert_eq!(council.searches(), 1);

    let second = p
        .refresh(&identity(), first.postcode_cache.clone(), None, now())
        .await
        .unwrap();
    assert_eq!(council.searches(), 1);
    assert_eq!(second.postcode_cache, first.postcode_cache);

    // A lookup for somewhere else is ignored.
    let elsewhere =
        DeviceIdentity::from_address("shed", &address("1 Other Road", "TE5 7PC")).unwrap();
    p.refresh(&elsewhere, first.postcode_cache.clone(), None, now())
        .await
        .unwrap();
    assert_eq!(council.searches(), 2);
}

#[tokio::test]
async fn stale_lookup_is_searched_again_once() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("L2", "42")])
            .with_location("L2", Probe::Events(vec![event(1, &[Category::Domestic])])),
    );
    let stale = PostcodeLookup {
        location: identity().location,
        location_ids: vec!["OLD".into()],
        fetched_at: now(),
    };

    let state = pipeline(council.clone())
        .refresh(&identity(), Some(stale), None, now())
        .await
        .unwrap();
    assert_eq!(council.searches(), 1);
    assert_eq!(state.collections.len(), 1);
    assert_eq!(state.postcode_cache.unwrap().location_ids, vec!["L2".to_owned()]);
}

#[tokio::test]
async fn fresh_lookup_with_no_schedule_is_not_searched_again() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("L2", "42")])
            .with_location("L2", Probe::Events(vec![])),
    );
    let err = pipeline(council.clone())
        .refresh(&identity(), None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable(_)));
    assert_eq!(council.searches(), 1);
}

struct MuteDevice;

#[async_trait]
impl DeviceGateway for MuteDevice {
    async fn address(&self, _device_id: &str, _token: &str) -> Result<DeviceAddress> {
        Ok(address("42 Mill Lane", "TE5 7PC"))
    }

    async fn notify_progress(&self, _device_id: &str, _message: &str) -> Result<()> {
        Err(Error::Http("progressive response rejected".into()))
    }
}

#[tokio::test]
async fn failing_progress_notice_does_not_abort_refresh() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("L2", "42")])
            .with_location("L2", Probe::Events(vec![event(1, &[Category::Domestic])])),
    );
    let target = ProgressTarget {
        device: Arc::new(MuteDevice),
        device_id: "kitchen".into(),
    };
    let state = pipeline(council)
        .refresh(&identity(), None, Some(target), now())
        .await
        .unwrap();
    assert_eq!(state.collections.len(), 1);
}

#[tokio::test]
async fn progress_notice_is_sent() {
    let council = Arc::new(
        FakeCouncil::default()
            .with_postcode("TE57PC", vec![location("L2", "42")])
            .with_location("L2", Probe::Events(vec![event(1, &[Category::Domestic])])),
    );
    let device = Arc::new(StaticDevice::new(address("42 Mill Lane", "TE5 7PC")));
    let target = ProgressTarget {
        device: device.clone(),
        device_id: "kitchen".into(),
    };
    pipeline(council)
        .refresh(&identity(), None, Some(target), now())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(device.notices(), vec![bc_sessions::device::PLEASE_WAIT.to_owned()]);
}
