//! Protocol-level tests of the legacy option-code menu.

use kband_fe::frontend::{FeedId, Polarization, PowerMeterMode};
use kband_fe::{CalibrationConfig, Dispatcher, FrontEnd, FrontEndError, Response};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(FrontEnd::with_seed(CalibrationConfig::default(), 99))
}

async fn feed_report(d: &Dispatcher) -> String {
    match d.dispatch(12).await.unwrap() {
        Response::Text(text) => text,
        other => panic!("code 12 must return text, got {other:?}"),
    }
}

#[tokio::test]
async fn fresh_receiver_reports_both_feeds_on_the_sky() {
    let d = dispatcher();
    assert_eq!(
        feed_report(&d).await,
        "feed 1 is on the sky\nfeed 2 is on the sky\n"
    );
}

#[tokio::test]
async fn feed_codes_round_trip_through_the_report() {
    let d = dispatcher();

    d.dispatch(14).await.unwrap(); // feed 1 -> load
    assert_eq!(
        feed_report(&d).await,
        "feed 1 is on the load\nfeed 2 is on the sky\n"
    );

    d.dispatch(16).await.unwrap(); // feed 2 -> load
    assert_eq!(
        feed_report(&d).await,
        "feed 1 is on the load\nfeed 2 is on the load\n"
    );

    d.dispatch(13).await.unwrap(); // feed 1 -> sky
    d.dispatch(15).await.unwrap(); // feed 2 -> sky
    assert_eq!(
        feed_report(&d).await,
        "feed 1 is on the sky\nfeed 2 is on the sky\n"
    );
}

#[tokio::test]
async fn noise_diode_codes_round_trip() {
    let d = dispatcher();
    assert_eq!(d.dispatch(22).await.unwrap(), Response::Flag(false));

    d.dispatch(23).await.unwrap();
    assert_eq!(d.dispatch(22).await.unwrap(), Response::Flag(true));

    d.dispatch(24).await.unwrap();
    assert_eq!(d.dispatch(22).await.unwrap(), Response::Flag(false));
}

#[tokio::test]
async fn unknown_codes_fail_without_mutating_state() {
    let d = dispatcher();
    d.dispatch(14).await.unwrap();
    d.dispatch(23).await.unwrap();
    let report_before = feed_report(&d).await;

    for code in [999, 0, 19, 29, 54, -7] {
        let err = d.dispatch(code).await.unwrap_err();
        assert!(matches!(err, FrontEndError::UnrecognizedOption(c) if c == code));
    }

    assert_eq!(feed_report(&d).await, report_before);
    assert_eq!(d.dispatch(22).await.unwrap(), Response::Flag(true));
}

#[tokio::test]
async fn power_meter_read_returns_four_indexed_channels() {
    let d = dispatcher();
    let readings = match d.dispatch(17).await.unwrap() {
        Response::Readings(r) => r,
        other => panic!("code 17 must return readings, got {other:?}"),
    };
    assert_eq!(readings.len(), 4);

    // order is feed1-E, feed1-H, feed2-E, feed2-H: undo each channel's gain
    // factor and check the operating temperature lands in that channel's
    // sky band
    let cal = CalibrationConfig::default();
    let channels = [
        (FeedId::One, Polarization::E),
        (FeedId::One, Polarization::H),
        (FeedId::Two, Polarization::E),
        (FeedId::Two, Polarization::H),
    ];
    for (i, ((feed, pol), reading)) in channels.into_iter().zip(&readings).enumerate() {
        assert_eq!(reading.index, (i + 1) as u8);
        let t_op = reading.value * cal.tsys_factor.get(feed, pol);
        let t_sky = cal.sky.t_cosmic_k
            + cal.t_receiver_k.get(feed, pol)
            + cal.sky.t_spillover_k
            + cal.sky.t_atmosphere_k;
        assert!(
            t_op >= t_sky && t_op < t_sky + 0.5,
            "channel {} T_op {t_op} outside [{t_sky}, {})",
            i + 1,
            t_sky + 0.5
        );
    }
}

#[tokio::test]
async fn temperature_read_uses_the_legacy_key_names() {
    let d = dispatcher();
    let temps = match d.dispatch(31).await.unwrap() {
        Response::Temperatures(t) => t,
        other => panic!("code 31 must return temperatures, got {other:?}"),
    };

    let json = serde_json::to_value(temps).unwrap();
    let map = json.as_object().unwrap();
    let mut keys: Vec<_> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["12K", "70K", "load1", "load2"]);

    assert_eq!(map["load1"].as_f64().unwrap(), 320.0);
    assert_eq!(map["load2"].as_f64().unwrap(), 320.0);
    let cold = map["12K"].as_f64().unwrap();
    let warm = map["70K"].as_f64().unwrap();
    assert!((15.0..15.01).contains(&cold));
    assert!((80.0..80.5).contains(&warm));
}

#[tokio::test]
async fn meter_mode_codes_address_the_encoded_channel() {
    let d = dispatcher();

    // 401: feed 1 H to dBm; everything else stays in watts
    d.dispatch(401).await.unwrap();
    let fe = d.frontend();
    assert_eq!(
        fe.feed(FeedId::One).channel(Polarization::H).meter_mode().await,
        PowerMeterMode::Dbm
    );
    assert_eq!(
        fe.feed(FeedId::One).channel(Polarization::E).meter_mode().await,
        PowerMeterMode::Watts
    );
    assert_eq!(
        fe.feed(FeedId::Two).channel(Polarization::H).meter_mode().await,
        PowerMeterMode::Watts
    );

    // 391 flips it back to watts
    d.dispatch(391).await.unwrap();
    assert_eq!(
        fe.feed(FeedId::One).channel(Polarization::H).meter_mode().await,
        PowerMeterMode::Watts
    );

    // 402: feed 2 E to dBm
    d.dispatch(402).await.unwrap();
    assert_eq!(
        fe.feed(FeedId::Two).channel(Polarization::E).meter_mode().await,
        PowerMeterMode::Dbm
    );
}

#[tokio::test]
async fn mode_changes_never_disturb_the_reading() {
    let d = dispatcher();
    let before = match d.dispatch(17).await.unwrap() {
        Response::Readings(r) => r,
        _ => unreachable!(),
    };
    for code in [400, 401, 402, 403] {
        d.dispatch(code).await.unwrap();
    }
    let after = match d.dispatch(17).await.unwrap() {
        Response::Readings(r) => r,
        _ => unreachable!(),
    };
    // readings jitter but stay in the same watts-proxy decade; a dBm-mode
    // leak would shift them by ten orders of magnitude
    for (b, a) in before.iter().zip(&after) {
        assert!((a.value / b.value - 1.0).abs() < 0.1);
    }
}

#[tokio::test]
async fn preamp_codes_floor_both_of_that_feeds_channels() {
    let d = dispatcher();
    d.dispatch(26).await.unwrap(); // preamp 1 off

    let readings = match d.dispatch(17).await.unwrap() {
        Response::Readings(r) => r,
        _ => unreachable!(),
    };
    assert_eq!(readings[0].value, 1e-10);
    assert_eq!(readings[1].value, 1e-10);
    assert!(readings[2].value > 1e-10);
    assert!(readings[3].value > 1e-10);

    d.dispatch(25).await.unwrap(); // preamp 1 back on
    let restored = match d.dispatch(17).await.unwrap() {
        Response::Readings(r) => r,
        _ => unreachable!(),
    };
    assert!(restored[0].value > 1e-10);
}
