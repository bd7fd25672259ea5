use adbms_lib::commands::{Command, CommandCode, CommandKind};
use adbms_lib::pec::{pec10, pec15};
use adbms_lib::protocol::{
    build_command_frame, build_read_frame, build_write_frame, parse_response, CellVoltages,
    ChainLength, ParseOptions, RegisterGroup, REGISTER_GROUP_LEN,
};
use adbms_lib::Error;
use test_case::test_case;

const REFON: RegisterGroup = [0x80, 0x00, 0x00, 0x00, 0x00, 0x00];

fn chain(devices: usize) -> ChainLength {
    ChainLength::new(devices).unwrap()
}

fn groups(devices: usize) -> Vec<RegisterGroup> {
    (0..devices)
        .map(|device| {
            let d = device as u8;
            [d, d.wrapping_mul(17), 0x55, 0xAA, 0x80 | d, !d]
        })
        .collect()
}

#[test]
fn write_configuration_a_on_single_device() {
    let code = Command::Wrcfga.code();
    assert_eq!(code.get(), 0x0001);
    assert_eq!(pec15(&code.to_be_bytes()), 0x3D6E);
    assert_eq!(pec10(&REFON, None), 0x0137);
    assert_eq!(pec10(&REFON, Some(0x00)), pec10(&REFON, None));

    let frame = build_write_frame(code, &[REFON]).unwrap();
    assert_eq!(
        frame,
        [0x00, 0x01, 0x3D, 0x6E, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x37]
    );
}

#[test]
fn empty_input_checksums() {
    assert_eq!(pec15(&[]), 32);
    assert_eq!(pec10(&[], None), 0x008F);
}

#[test_case(1)]
#[test_case(2)]
#[test_case(5)]
#[test_case(16)]
fn frame_lengths(devices: usize) {
    let code = Command::Rdcvc.code();
    assert_eq!(build_command_frame(code).len(), 4);
    assert_eq!(
        build_write_frame(Command::Wrcfgc.code(), &groups(devices))
            .unwrap()
            .len(),
        4 + 8 * devices
    );
    assert_eq!(
        build_read_frame(code, chain(devices), REGISTER_GROUP_LEN)
            .unwrap()
            .len(),
        4 + 8 * devices
    );
}

#[test_case(1)]
#[test_case(3)]
#[test_case(8)]
fn echoed_write_frame_validates(devices: usize) {
    let sent = groups(devices);
    let frame = build_write_frame(Command::Wrcfgd.code(), &sent).unwrap();
    let options = ParseOptions {
        check_command_echo: true,
    };
    let received = parse_response(&frame, chain(devices), REGISTER_GROUP_LEN, options).unwrap();
    assert_eq!(received.len(), devices);
    for (group, expected) in received.iter().zip(&sent) {
        assert!(group.pec_ok);
        assert_eq!(&group.data, expected);
        assert_eq!(group.command_counter, 0);
    }
}

#[test]
fn single_bit_errors_hit_only_their_device() {
    let devices = 3;
    let frame = build_write_frame(Command::Wrcfga.code(), &groups(devices)).unwrap();
    for device in 0..devices {
        for byte in 0..REGISTER_GROUP_LEN {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[4 + device * 8 + byte] ^= 1 << bit;
                let received = parse_response(
                    &corrupted,
                    chain(devices),
                    REGISTER_GROUP_LEN,
                    ParseOptions::default(),
                )
                .unwrap();
                for (n, group) in received.iter().enumerate() {
                    assert_eq!(group.pec_ok, n != device, "device {device} byte {byte} bit {bit}");
                }
            }
        }
    }
}

#[test]
fn corrupted_command_echo_fails_whole_response() {
    let mut frame = build_write_frame(Command::Wrcfga.code(), &groups(2)).unwrap();
    frame[1] ^= 0x04;
    let options = ParseOptions {
        check_command_echo: true,
    };
    let err = parse_response(&frame, chain(2), REGISTER_GROUP_LEN, options).unwrap_err();
    assert!(matches!(err, Error::CommandPecMismatch { .. }));
    assert!(err.is_retryable());
}

#[test]
fn contract_violations_fail_fast() {
    let frame = build_read_frame(Command::Rdcva.code(), chain(2), REGISTER_GROUP_LEN).unwrap();
    let err =
        parse_response(&frame[..19], chain(2), REGISTER_GROUP_LEN, ParseOptions::default())
            .unwrap_err();
    assert_eq!(
        err,
        Error::BufferLength {
            expected: 20,
            actual: 19
        }
    );
    assert!(!err.is_retryable());
    assert_eq!(ChainLength::new(0), Err(Error::InvalidChainLength(0)));
    assert!(matches!(
        parse_response(&frame, chain(2), 4, ParseOptions::default()),
        Err(Error::GroupWidth { .. })
    ));
}

#[test]
fn received_cell_voltages() {
    // RDCVA response with command counter 0
    let rx_buffer = [
        0x00, 0x04, 0x07, 0xC2, 0x10, 0x27, 0x00, 0x00, 0xE8, 0x03, 0x01, 0x38,
    ];
    let received =
        parse_response(&rx_buffer, chain(1), REGISTER_GROUP_LEN, ParseOptions::default()).unwrap();
    assert!(received[0].pec_ok);
    let volts = CellVoltages::decode(&received[0].data);
    assert!((volts[0] - 3.0).abs() < 1e-6);
    assert_eq!(volts[1], 1.5);
    assert!((volts[2] - 1.65).abs() < 1e-6);
}

#[test]
fn catalog_drives_frame_shape() {
    for command in Command::ALL {
        assert_eq!(command.code().get() >> 11, 0);
        assert_eq!(CommandCode::new(command.code().get()), Ok(command.code()));
        match command.kind() {
            CommandKind::Action => {
                assert_eq!(build_command_frame(command.code())[..2], command.code().to_be_bytes())
            }
            CommandKind::WriteConfiguration => {
                assert!(build_write_frame(command.code(), &[REFON]).is_ok())
            }
            CommandKind::ReadConfiguration | CommandKind::ReadMeasurement => {
                assert!(build_read_frame(command.code(), chain(1), REGISTER_GROUP_LEN).is_ok())
            }
        }
    }
}
