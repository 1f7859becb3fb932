use domain::DomainError;
use domain::bus::Parity;
use domain::tag::{LinearScale, WriteMode};
use infrastructure::PlantConfig;
use std::time::Duration;

const PLANT: &str = r#"
buses:
  - name: daq
    port: /dev/ttyUSB0
    baud: 19200
    parity: E
  - name: power
    port: /dev/ttyUSB1

devices:
  - name: AI1
    type: AI
    bus: daq
    addr: 1
    channels: 8
    retries: 3
    retry_delay_ms: 20
  - name: TC1
    type: TDA
    bus: daq
    addr: 2
  - name: AO1
    type: AO
    bus: daq
    addr: 3
  - name: PSU1
    type: PPS
    bus: power
    addr: 4

tags:
  - name: P1
    device: AI1
    channel: 0
    scale: 0.1
  - name: T1
    device: TC1
    channel: 1
    scale: { gain: 0.1, offset: -5.0 }
  - name: V1
    device: AO1
    channel: 1
    unit: V
  - name: V1_pct
    device: AO1
    channel: 1
    unit: V
    kind: percent
  - name: PSU1_cmd
    device: PSU1
  - name: setpoint
"#;

#[test]
fn test_parses_full_plant() {
    let plant = PlantConfig::from_yaml_str(PLANT).expect("valid plant");

    assert_eq!(plant.buses.len(), 2);
    let daq = &plant.buses[0].spec;
    assert_eq!(daq.port, "/dev/ttyUSB0");
    assert_eq!(daq.baud, 19200);
    assert_eq!(daq.parity, Parity::Even);
    assert_eq!(daq.stop_bits, 1);
    assert_eq!(daq.byte_size, 8);
    assert_eq!(daq.timeout_ms, 200);

    assert_eq!(plant.devices.len(), 4);
    let ai = &plant.devices[0];
    assert_eq!(ai.addr, 1);
    assert_eq!(ai.channels, Some(8));
    assert_eq!(ai.retry_policy().attempts(), 3);
    assert_eq!(ai.retry_policy().delay(), Duration::from_millis(20));
    assert_eq!(plant.devices[1].retry_policy().attempts(), 1);
}

#[test]
fn test_builds_tag_definitions() {
    let plant = PlantConfig::from_yaml_str(PLANT).unwrap();
    let tags = plant.tag_definitions();

    let p1 = &tags[0];
    assert_eq!(p1.device(), Some("AI1"));
    assert_eq!(p1.scale, LinearScale::new(0.1, 0.0));

    let t1 = &tags[1];
    assert_eq!(t1.scale, LinearScale::new(0.1, -5.0));

    assert_eq!(tags[2].write.mode, WriteMode::Voltage);
    assert_eq!(tags[2].write.reg_scale, 1000);
    assert_eq!(tags[3].write.mode, WriteMode::Percent);

    let psu = &tags[4];
    assert_eq!(psu.binding.as_ref().unwrap().write_channel(), 1);

    assert!(!tags[5].is_bound());
}

#[test]
fn test_settings_default_when_absent() {
    let plant = PlantConfig::from_yaml_str(PLANT).unwrap();
    assert_eq!(plant.settings.poll_period(), Duration::from_millis(200));
    assert_eq!(plant.settings.write_wait(), Duration::from_millis(100));
    assert_eq!(plant.settings.join_timeout(), Duration::from_millis(1000));
    assert_eq!(plant.settings.health_tag.as_deref(), Some("comm_bad"));
}

#[test]
fn test_settings_override() {
    let yaml = format!(
        "{}\nsettings:\n  poll_period_ms: 50\n  health_tag: link_down\n",
        PLANT
    );
    let plant = PlantConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(plant.settings.poll_period_ms, 50);
    assert_eq!(plant.settings.write_wait_ms, 100);
    assert_eq!(plant.settings.health_tag.as_deref(), Some("link_down"));
}

#[test]
fn test_rejects_unknown_device_type() {
    let yaml = r#"
buses:
  - name: daq
    port: /dev/ttyUSB0
devices:
  - name: X1
    type: FLUX_CAPACITOR
    bus: daq
    addr: 1
"#;
    let err = PlantConfig::from_yaml_str(yaml).unwrap_err();
    assert_eq!(err, DomainError::UnknownDeviceType("FLUX_CAPACITOR".into()));
}

#[test]
fn test_rejects_device_on_undeclared_bus() {
    let yaml = r#"
buses:
  - name: daq
    port: /dev/ttyUSB0
devices:
  - name: AI1
    type: AI
    bus: nowhere
    addr: 1
"#;
    let err = PlantConfig::from_yaml_str(yaml).unwrap_err();
    assert_eq!(
        err,
        DomainError::UnknownBus {
            device: "AI1".into(),
            bus: "nowhere".into()
        }
    );
}

#[test]
fn test_rejects_tag_on_undeclared_device() {
    let yaml = r#"
tags:
  - name: P1
    device: AI9
"#;
    let err = PlantConfig::from_yaml_str(yaml).unwrap_err();
    assert_eq!(
        err,
        DomainError::UnknownDevice {
            tag: "P1".into(),
            device: "AI9".into()
        }
    );
}

#[test]
fn test_rejects_duplicate_names() {
    let yaml = r#"
tags:
  - name: setpoint
  - name: setpoint
"#;
    assert!(matches!(
        PlantConfig::from_yaml_str(yaml),
        Err(DomainError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_rejects_bound_health_tag() {
    let yaml = r#"
buses:
  - name: daq
    port: /dev/ttyUSB0
devices:
  - name: AI1
    type: AI
    bus: daq
    addr: 1
tags:
  - name: comm_bad
    device: AI1
"#;
    assert!(matches!(
        PlantConfig::from_yaml_str(yaml),
        Err(DomainError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_rejects_bad_parity() {
    let yaml = r#"
buses:
  - name: daq
    port: /dev/ttyUSB0
    parity: X
"#;
    assert!(matches!(
        PlantConfig::from_yaml_str(yaml),
        Err(DomainError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_empty_document_is_an_empty_plant() {
    let plant = PlantConfig::from_yaml_str("{}").unwrap();
    assert!(plant.buses.is_empty());
    assert!(plant.tag_definitions().is_empty());
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let err = PlantConfig::load("/nonexistent/plant").unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_env_override_applies_on_load() {
    let path = std::env::temp_dir().join(format!("plant-env-{}.yaml", std::process::id()));
    std::fs::write(&path, "settings:\n  join_timeout_ms: 400\n").unwrap();

    // SAFETY: no other test in this binary reads or writes this variable
    unsafe { std::env::set_var("PLANT__SETTINGS__JOIN_TIMEOUT_MS", "700") };
    let loaded = PlantConfig::load(path.to_str().unwrap());
    unsafe { std::env::remove_var("PLANT__SETTINGS__JOIN_TIMEOUT_MS") };
    std::fs::remove_file(&path).ok();

    let plant = loaded.unwrap();
    assert_eq!(plant.settings.join_timeout_ms, 700);
    assert_eq!(plant.settings.poll_period_ms, 200);
}
