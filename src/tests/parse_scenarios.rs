use crate::dex::{DexErrorKind, DexFile, DexVersion, ResolveError, Table, NO_INDEX};
use crate::tests::image::{sample_image, DexImage, CHECKSUM};

fn minimal_header(version: &[u8; 4]) -> Vec<u8>
{
    let mut bytes = b"dex\n".to_vec();
    bytes.extend_from_slice(version);
    bytes.extend_from_slice(&[0u8; 104]);
    bytes
}

#[test]
fn minimal_header_parses_empty_tables()
{
    let bytes = minimal_header(b"035\0");
    assert_eq!(bytes.len(), 112);
    let dex = DexFile::from_bytes(&bytes).expect("minimal header");
    let summary = dex.summary();

    assert_eq!(summary.version, DexVersion::V035);
    assert_eq!(summary.strings_count, 0);
    assert_eq!(summary.types_count, 0);
    assert_eq!(summary.prototypes_count, 0);
    assert_eq!(summary.fields_count, 0);
    assert_eq!(summary.methods_count, 0);
    assert_eq!(summary.classes_count, 0);
    assert!(dex.diagnostics().is_empty());
}

#[test]
fn empty_table_with_stray_offset_is_ignored()
{
    let mut bytes = minimal_header(b"035\0");
    bytes[76..80].copy_from_slice(&0x1000u32.to_le_bytes());
    let dex = DexFile::from_bytes(&bytes).expect("empty proto_ids");
    assert_eq!(dex.header().proto_ids.off, 0x1000);
    assert!(dex.prototypes().is_empty());
    assert!(dex.diagnostics().is_empty());
}

#[test]
fn single_string_resolves_hello()
{
    let x: u32 = 0x74;
    let mut bytes = minimal_header(b"035\0");
    bytes[56..60].copy_from_slice(&1u32.to_le_bytes());
    bytes[60..64].copy_from_slice(&0x70u32.to_le_bytes());
    bytes.extend_from_slice(&x.to_le_bytes());
    bytes.push(5);
    bytes.extend_from_slice(b"hello");

    let dex = DexFile::from_bytes(&bytes).expect("one string");
    assert_eq!(dex.strings().len(), 1);
    assert_eq!(dex.strings()[0].string_data_off, x);
    assert_eq!(dex.strings()[0].value, "hello");
    assert_eq!(dex.string_pool(), vec!["hello"]);
}

#[test]
fn unsupported_version_fails()
{
    let e = DexFile::from_bytes(&minimal_header(b"099\0")).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::UnsupportedVersion);
}

#[test]
fn bad_magic_fails()
{
    let mut bytes = sample_image().build();
    bytes[0] = b'D';
    let e = DexFile::from_bytes(&bytes).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::BadMagic);
}

#[test]
fn short_buffer_fails()
{
    let bytes = sample_image().build();
    let e = DexFile::from_bytes(&bytes[..111]).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::TooShort);
}

#[test]
fn header_fields_match_what_was_written()
{
    let mut image = sample_image();
    image.version = Some(b"039\0");
    let bytes = image.build();
    let dex = DexFile::from_bytes(&bytes).unwrap();
    let h = dex.header();

    assert_eq!(h.version, DexVersion::V039);
    assert_eq!(h.checksum, CHECKSUM);
    assert_eq!(h.signature[0], 0xA0);
    assert_eq!(h.signature[19], 0xB3);
    assert_eq!(h.file_size as usize, bytes.len());
    assert_eq!(h.header_size, 0x70);
    assert_eq!(h.endian_tag, 0x12345678);
    assert_eq!(h.string_ids.size, 11);
    assert_eq!(h.string_ids.off, 0x70);
    assert_eq!(h.class_defs.size, 2);
}

#[test]
fn resolves_sample_file()
{
    let dex = DexFile::from_bytes(&sample_image().build()).unwrap();
    assert!(dex.diagnostics().is_empty(), "{:?}", dex.diagnostics());

    let types: Vec<&str> = dex.types().iter().map(|t| t.descriptor.as_str()).collect();
    assert_eq!(types, vec!["I", "Lcom/example/Foo;", "Ljava/lang/Object;", "Ljava/lang/Runnable;", "V"]);

    let add = &dex.prototypes()[1];
    assert_eq!(add.shorty, "III");
    assert_eq!(add.return_type, "I");
    assert_eq!(add.parameters, vec!["I", "I"]);

    let field = &dex.fields()[0];
    assert_eq!(field.class_name, "Lcom/example/Foo;");
    assert_eq!(field.type_name, "I");
    assert_eq!(field.field_name, "count");

    let descriptors: Vec<String> = dex.methods().iter().map(|m| m.descriptor()).collect();
    assert_eq!(descriptors, vec![
        "Lcom/example/Foo;-><init>()V",
        "Lcom/example/Foo;->run()V",
        "Lcom/example/Foo;->add(II)I",
    ]);
    assert_eq!(dex.methods()[2].prototype, "III");
    assert_eq!(dex.method_names(), vec!["<init>", "run", "add"]);
    assert_eq!(dex.class_names(), vec!["Lcom/example/Foo;", "Ljava/lang/Object;"]);

    let foo = dex.find_class("Lcom/example/Foo;").unwrap();
    assert_eq!(foo.superclass_name.as_deref(), Some("Ljava/lang/Object;"));
    assert_eq!(foo.interfaces, vec!["Ljava/lang/Runnable;"]);
    assert_eq!(foo.source_file.as_deref(), Some("Foo.java"));
}

#[test]
fn sentinel_superclass_never_resolves()
{
    let dex = DexFile::from_bytes(&sample_image().build()).unwrap();
    let object = &dex.class_defs()[1];
    assert_eq!(object.class_name, "Ljava/lang/Object;");
    assert_eq!(object.superclass_idx, None);
    assert_eq!(object.superclass_name, None);
    assert_eq!(object.source_file_idx, None);
    assert_eq!(object.source_file, None);
    assert!(dex.diagnostics().is_empty());
}

#[test]
fn bad_descriptor_index_is_blank_and_parse_is_repeatable()
{
    let mut image = DexImage::with_strings(&["I", "V"]);
    image.types = vec![0, 40, 1];
    let bytes = image.build();

    let first = DexFile::from_bytes(&bytes).unwrap();
    let types: Vec<&str> = first.types().iter().map(|t| t.descriptor.as_str()).collect();
    assert_eq!(types, vec!["I", "", "V"]);
    assert_eq!(first.diagnostics().len(), 1);
    assert_eq!(first.diagnostics()[0].table, Table::Types);
    assert_eq!(first.diagnostics()[0].error, ResolveError::IndexOutOfRange { index: 40, len: 2 });

    let second = DexFile::from_bytes(&bytes).unwrap();
    assert_eq!(first, second);
}

#[test]
fn corrupt_string_offset_blanks_one_string()
{
    let image = DexImage::with_strings(&["alpha", "beta", "gamma"]);
    let mut bytes = image.build();
    // Point string 1 past the end of the file.
    bytes[0x74..0x78].copy_from_slice(&0xFFFF_0000u32.to_le_bytes());

    let dex = DexFile::from_bytes(&bytes).unwrap();
    assert_eq!(dex.string_pool(), vec!["alpha", "", "gamma"]);
    assert_eq!(dex.diagnostics().len(), 1);
    assert_eq!(dex.diagnostics()[0].entry, 1);
    assert_eq!(dex.diagnostics()[0].error, ResolveError::Read(DexErrorKind::OutOfBounds));
    assert_eq!(dex.summary().diagnostics_count, 1);
}

#[test]
fn unterminated_length_prefix_is_malformed_varint()
{
    let image = DexImage::with_strings(&["ok", "bad"]);
    let mut bytes = image.build();
    let off = u32::from_le_bytes(bytes[0x74..0x78].try_into().unwrap()) as usize;
    bytes[off..off + 5].copy_from_slice(&[0x80; 5]);
    bytes.extend_from_slice(&[0x80; 8]);

    let dex = DexFile::from_bytes(&bytes).unwrap();
    assert_eq!(dex.strings()[0].value, "ok");
    assert_eq!(dex.strings()[1].value, "");
    assert_eq!(dex.diagnostics()[0].error, ResolveError::Read(DexErrorKind::MalformedVarint));
}

#[test]
fn non_ascii_strings_decode()
{
    let dex = DexFile::from_bytes(&DexImage::with_strings(&["café", "日本語", "a\0b", "\u{1F600}"]).build()).unwrap();
    assert_eq!(dex.string_pool(), vec!["café", "日本語", "a\0b", "\u{1F600}"]);
    assert_eq!(dex.strings()[3].utf16_size, 2);
}

#[test]
fn table_outside_buffer_fails_whole_parse()
{
    let mut bytes = minimal_header(b"035\0");
    bytes[64..68].copy_from_slice(&3u32.to_le_bytes());
    bytes[68..72].copy_from_slice(&0x6cu32.to_le_bytes());
    let e = DexFile::from_bytes(&bytes).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::OutOfBounds);
    assert!(e.to_string().contains("type_ids"), "{}", e);
}

#[test]
fn field_and_method_indices_out_of_range_are_blank()
{
    let mut image = sample_image();
    image.fields.push((99, 0, 9));
    image.methods.push((1, 7, 500));
    let dex = DexFile::from_bytes(&image.build()).unwrap();

    let f = &dex.fields()[1];
    assert_eq!(f.class_name, "");
    assert_eq!(f.field_name, "count");
    let m = &dex.methods()[3];
    assert_eq!(m.class_name, "Lcom/example/Foo;");
    assert_eq!(m.prototype, "");
    assert_eq!(m.method_name, "");
    assert_eq!(dex.method_names().len(), 3);

    let tables: Vec<Table> = dex.diagnostics().iter().map(|d| d.table).collect();
    assert_eq!(tables, vec![Table::Fields, Table::Methods, Table::Methods]);
}

#[test]
fn class_with_source_file_sentinel_and_bad_class_index()
{
    let mut image = sample_image();
    image.classes.push(super::image::ClassSpec::new(77, NO_INDEX));
    let dex = DexFile::from_bytes(&image.build()).unwrap();

    assert_eq!(dex.class_defs().len(), 3);
    assert_eq!(dex.class_defs()[2].class_name, "");
    assert_eq!(dex.class_names().len(), 2);
    assert_eq!(dex.diagnostics().len(), 1);
    assert_eq!(dex.diagnostics()[0].field, "class");
}

#[test]
fn summary_report_and_json()
{
    let dex = DexFile::from_bytes(&sample_image().build()).unwrap();
    let summary = dex.summary();
    let report = summary.to_string();
    assert!(report.contains("Version:    035"));
    assert!(report.contains("Checksum:   0x1234abcd"));
    assert!(report.contains("Classes:    2"));
    assert!(!report.contains("Unresolved"));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["methods_count"], 3);
    assert_eq!(json["version"], "035");
    assert_eq!(json["file_path"], serde_json::Value::Null);
}

#[test]
fn parsed_file_serializes()
{
    let dex = DexFile::from_bytes(&sample_image().build()).unwrap();
    let json = serde_json::to_value(&dex).unwrap();
    assert_eq!(json["class_defs"][1]["superclass_name"], serde_json::Value::Null);
    assert_eq!(json["methods"][2]["method_name"], "add");
}
