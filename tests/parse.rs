use std::io::Cursor;

use systemd_config::{
    Config, LINE_MAX, OptionValue, ParseError, Section, Unit, parse, parse_concurrent,
    parse_with_config, serialize, units_equivalent,
};

const SERVICE: &str = "# Example service
; managed by hand

[Unit]
Description=Example daemon
After=network.target \\
      remote-fs.target
Wants=network.target

[Service]
Type=notify
ExecStartPre=/usr/bin/mkdir -p /run/example
ExecStartPre=/usr/bin/chown nobody /run/example
ExecStart=/usr/bin/example --config /etc/example.conf
# Restart on crash only
Restart=on-failure

[Install]
WantedBy=multi-user.target
";

#[test]
fn realistic_service_file() {
    let unit: Unit = SERVICE.parse().unwrap();

    let names: Vec<_> = unit.sections().iter().map(Section::name).collect();
    assert_eq!(names, vec!["Unit", "Service", "Install"]);

    let unit_section = unit.section("Unit").unwrap();
    assert_eq!(
        unit_section.get("After"),
        Some("network.target \\\n      remote-fs.target")
    );

    let service = unit.section("Service").unwrap();
    assert_eq!(service.options().len(), 5);
    assert_eq!(
        service.get_all("ExecStartPre").collect::<Vec<_>>(),
        vec![
            "/usr/bin/mkdir -p /run/example",
            "/usr/bin/chown nobody /run/example"
        ]
    );
    assert_eq!(service.get("Restart"), Some("on-failure"));
}

#[test]
fn serialized_service_reparses_to_an_equivalent_unit() {
    let unit: Unit = SERVICE.parse().unwrap();
    let again: Unit = serialize(&unit).parse().unwrap();

    assert!(units_equivalent(&unit, &again));
}

#[test]
fn two_sections_round_trip_byte_for_byte() {
    let text = "[AAA]\nA=B\n\n[BBB]\nA=B\n";
    let unit = parse(text.as_bytes()).unwrap();

    assert_eq!(unit.sections().len(), 2);
    assert_eq!(serialize(&unit), text);
}

#[test]
fn match_section_in_order() {
    let unit = parse("[Match]\nA=B\nC=D\n".as_bytes()).unwrap();

    assert_eq!(
        unit.sections(),
        &[Section::with_options(
            "Match",
            vec![OptionValue::new("A", "B"), OptionValue::new("C", "D")]
        )]
    );
}

#[test]
fn empty_section_vanishes_on_output() {
    let unit = Unit::with_sections(vec![
        Section::new("A"),
        Section::with_options("B", vec![OptionValue::new("X", "Y")]),
    ]);

    assert_eq!(serialize(&unit), "[B]\nX=Y\n");
}

#[test]
fn option_before_section_fails() {
    assert!(matches!(
        parse("A=B\n".as_bytes()),
        Err(ParseError::OptionBeforeSection)
    ));
}

#[test]
fn line_length_boundary() {
    let too_long = "x".repeat(LINE_MAX);
    assert!(matches!(
        parse(too_long.as_bytes()),
        Err(ParseError::LineTooLong { max: LINE_MAX })
    ));

    let just_fits = format!("{}\n[S]\nA=B\n", "x".repeat(LINE_MAX - 1));
    let unit = parse(just_fits.as_bytes()).unwrap();
    assert_eq!(unit.section("S").and_then(|s| s.get("A")), Some("B"));
}

#[test]
fn custom_line_max() {
    let config = Config::default().with_line_max(16);
    let text = "[S]\nShort=1\n";

    assert!(parse_with_config(text.as_bytes(), &config).is_ok());
    assert!(matches!(
        parse_with_config("[S]\nRatherLongName=1\n".as_bytes(), &config),
        Err(ParseError::LineTooLong { max: 16 })
    ));
}

#[test]
fn errors_discard_the_partial_unit() {
    let result = parse("[Unit]\nDescription=fine\n[Service] oops\n".as_bytes());

    match result {
        Err(ParseError::GarbageAfterSectionName { section, garbage }) => {
            assert_eq!(section, "Service");
            assert_eq!(garbage, "oops");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn concurrent_and_sequential_agree() {
    let sequential = parse(SERVICE.as_bytes()).unwrap();
    let concurrent = parse_concurrent(Cursor::new(SERVICE), Config::default()).unwrap();
    assert_eq!(sequential, concurrent);

    let broken = "[Unit]\nDescription\n";
    assert!(matches!(
        parse(broken.as_bytes()),
        Err(ParseError::NewlineInOptionName)
    ));
    assert!(matches!(
        parse_concurrent(Cursor::new(broken), Config::default()),
        Err(ParseError::NewlineInOptionName)
    ));
}

#[test]
fn write_to_a_sink() {
    let unit: Unit = SERVICE.parse().unwrap();
    let mut sink = Vec::new();

    unit.write_to(&mut sink).unwrap();

    let reparsed = Unit::from_reader(sink.as_slice()).unwrap();
    assert!(units_equivalent(&unit, &reparsed));
}
