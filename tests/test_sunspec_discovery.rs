mod common;
use common::*;

use std::time::Duration;
use sunspec_export::sunspec::connection::{scan_models, ModelAddress, END_OF_MODELS};
use sunspec_export::sunspec::models::{CommonModel, InverterModelId, MeterModelId};
use sunspec_export::sunspec::SunSpecConnection;

fn connection(transport: &Arc<MockTransport>) -> SunSpecConnection {
    SunSpecConnection::new("test", Factory::BASE, transport.clone())
}

#[tokio::test]
async fn scan_walks_model_chain() -> Result<()> {
    common_setup();

    let transport = Factory::device(vec![Factory::common("Fronius"), Factory::inverter(101, 1000)]);
    let map = scan_models(&transport, Factory::BASE).await?;

    assert_eq!(map.len(), 2);
    assert_eq!(
        map.get(1),
        Some(ModelAddress {
            start: 40002,
            length: 68
        })
    );
    assert_eq!(
        map.get(101),
        Some(ModelAddress {
            start: 40070,
            length: 52
        })
    );
    assert_eq!(map.get(103), None);

    // signature, two headers, end marker
    assert_eq!(
        transport.reads(),
        vec![(40000, 2), (40002, 2), (40070, 2), (40122, 2)]
    );

    Ok(())
}

#[tokio::test]
async fn bad_signature_stops_the_scan() {
    common_setup();

    let transport = MockTransport::new();
    transport.load(Factory::BASE, &[0x1234, 0x5678, 1, 66]);

    let err = scan_models(&transport, Factory::BASE).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<SunSpecError>(),
        Some(&SunSpecError::InvalidSignature {
            address: 40000,
            signature: 0x1234_5678
        })
    );
    assert_eq!(transport.reads(), vec![(40000, 2)]);
}

#[tokio::test]
async fn resolve_follows_topology_preference() -> Result<()> {
    let transport = Factory::device(vec![
        Factory::common("Fronius"),
        Factory::filler(201, 107),
        Factory::meter(0),
    ]);
    let map = scan_models(&transport, Factory::BASE).await?;

    let (id, address) = map.resolve(&MeterModelId::PREFERENCE)?;
    assert_eq!(id, 203);
    assert_eq!(address.start, 40002 + 68 + 107);

    let err = map.resolve(&InverterModelId::PREFERENCE).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SunSpecError>(),
        Some(&SunSpecError::ModelNotFound {
            ids: vec![103, 102, 101]
        })
    );

    Ok(())
}

#[tokio::test]
async fn repeated_model_id_keeps_first_block() -> Result<()> {
    let transport = Factory::device(vec![
        Factory::common("Fronius"),
        Factory::inverter(103, 1000),
        Factory::inverter(103, 2000),
    ]);
    let map = scan_models(&transport, Factory::BASE).await?;

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(103).map(|a| a.start), Some(40070));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_scan() -> Result<()> {
    common_setup();

    let transport = Arc::new(Factory::fronius_inverter(
        Factory::inverter(103, 2000),
        Factory::controls(10000, false),
    ));
    transport.set_read_delay(Duration::from_millis(50));
    let subject = connection(&transport);

    let (a, b, c) = futures::join!(
        subject.model_address_map(),
        subject.model_address_map(),
        subject.model_address_map()
    );
    let (a, b, c) = (a?, b?, c?);

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));

    let signature_reads = transport
        .reads()
        .into_iter()
        .filter(|r| *r == (40000, 2))
        .count();
    assert_eq!(signature_reads, 1);

    // later callers hit the cache without touching the device
    transport.clear_ops();
    subject.model_address_map().await?;
    assert!(transport.ops().is_empty());

    Ok(())
}

#[tokio::test]
async fn failed_scan_is_retried_by_next_caller() -> Result<()> {
    common_setup();

    let transport = Arc::new(Factory::fronius_inverter(
        Factory::inverter(103, 2000),
        Factory::controls(10000, false),
    ));
    transport.fail_next_reads(1);
    let subject = connection(&transport);

    let err = subject.model_address_map().await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SunSpecError>(),
        Some(&SunSpecError::Transport("connection reset by peer".to_string()))
    );

    let map = subject.model_address_map().await?;
    assert_eq!(map.ids(), vec![1, 103, 120, 121, 122, 123]);

    Ok(())
}

#[tokio::test]
async fn common_model_is_read_once() -> Result<()> {
    common_setup();

    let transport = Arc::new(Factory::fronius_inverter(
        Factory::inverter(103, 2000),
        Factory::controls(10000, false),
    ));
    let subject = connection(&transport);

    let first = subject.common_model().await?;
    let second = subject.common_model().await?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.manufacturer, "Fronius");
    assert_eq!(first.model, "Primo 5.0-1");
    assert_eq!(first.serial_number, "29071234");

    let common_reads = transport
        .reads()
        .into_iter()
        .filter(|r| *r == (40002, 68))
        .count();
    assert_eq!(common_reads, 1);

    Ok(())
}

#[tokio::test]
async fn inverter_model_found_through_scan() -> Result<()> {
    let transport = Arc::new(Factory::fronius_inverter(
        Factory::inverter(103, 2000),
        Factory::controls(10000, false),
    ));
    let subject = connection(&transport);

    let inverter = subject.inverter_model().await?;
    assert_eq!(inverter.id, 103);
    assert_eq!(inverter.w, 2000);
    assert!(transport.reads().contains(&(FRONIUS_INVERTER_ADDRESS, 52)));

    Ok(())
}

#[tokio::test]
async fn oversized_model_length_is_a_protocol_error() {
    common_setup();

    let transport = Arc::new(MockTransport::new());
    transport.load(Factory::BASE, &[0x5375, 0x6E53, 1, 0xFFFF]);

    let expected = SunSpecError::InvalidModelLength {
        id: 1,
        address: 40002,
        length: 0xFFFF,
    };

    let err = scan_models(&*transport, Factory::BASE).await.unwrap_err();
    assert_eq!(err.downcast_ref::<SunSpecError>(), Some(&expected));

    // the cached scan hands callers the same typed error
    let err = connection(&transport).model_address_map().await.unwrap_err();
    assert_eq!(err.downcast_ref::<SunSpecError>(), Some(&expected));
}

#[tokio::test]
async fn chain_past_the_address_space_is_a_protocol_error() {
    common_setup();

    let base = 65530;
    let transport = MockTransport::new();
    transport.load(base, &[0x5375, 0x6E53, 1, 66]);

    let err = scan_models(&transport, base).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<SunSpecError>(),
        Some(&SunSpecError::AddressOverflow { address: 65532 })
    );
}

#[tokio::test]
async fn end_marker_with_length_still_ends_the_chain() -> Result<()> {
    common_setup();

    let transport = Factory::device(vec![Factory::common("Fronius")]);
    // end marker at 40070 claiming a body, with junk after it
    transport.load(40070, &[END_OF_MODELS, 5, 101, 50]);

    let map = scan_models(&transport, Factory::BASE).await?;

    assert_eq!(map.ids(), vec![1]);
    assert_eq!(transport.reads(), vec![(40000, 2), (40002, 2), (40070, 2)]);

    Ok(())
}

#[tokio::test]
async fn common_model_tolerates_unset_string_registers() -> Result<()> {
    common_setup();

    let common = Factory::common("Fronius")
        .raw(&CommonModel::OPT, &[0xFFFF; 8])
        .raw(&CommonModel::VR, &[0x332E, 0x3134, 0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF]);
    let transport = Arc::new(Factory::device(vec![common, Factory::inverter(103, 2000)]));

    let common = connection(&transport).common_model().await?;

    assert_eq!(common.manufacturer, "Fronius");
    assert_eq!(common.options, "");
    assert_eq!(common.version, "3.14");

    Ok(())
}
