//! Décompiler puis recompiler une archive bien formée redonne les mêmes octets.

use core::num::NonZeroUsize;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use qadam_core::{obfuscate, CharsetTable};
use qadam_fil::{
    compile, compile_reader, decompile, decompile_with, Archive, CompileError, DecompileOptions, ErrorClass,
    FormatError, Section,
};

fn archive_strategy() -> impl Strategy<Value = Archive> {
    prop::collection::vec(any::<u8>(), 0..200).prop_flat_map(|body| {
        let len = body.len() as u32;
        prop::collection::vec(0..=len, 0..12).prop_map(move |mut starts| {
            starts.sort_unstable();
            let sections = (0u8..).zip(starts).map(|(index, body_offset)| Section { index, body_offset }).collect();
            Archive::new(sections, body.clone()).unwrap()
        })
    })
}

/// Corps faits de courts enregistrements et de chaînes obfusquées, comme les vrais fichiers.
fn text_like_body() -> impl Strategy<Value = Vec<u8>> {
    let record = prop::collection::vec(any::<u8>(), 1..4);
    let text = "[a-zA-Z0-9 ,.!?áéíóúůčřšž]{1,24}".prop_map(|s| {
        let cs = CharsetTable::cp852();
        let mut bytes: Vec<u8> = s.chars().map(|c| obfuscate(cs.display_to_byte(c).unwrap())).collect();
        bytes.push(0);
        bytes
    });
    prop::collection::vec(prop_oneof![record, text], 0..16).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn any_archive_survives(archive in archive_strategy()) {
        let cs = CharsetTable::cp852();
        let bytes = archive.to_bytes().unwrap();
        let text = decompile(&bytes, &cs).unwrap();
        let again = compile(&text, &cs);
        // le listing d’une archive sans section ne se recompile pas
        if archive.sections().is_empty() {
            prop_assert!(matches!(again, Err(CompileError::NoSections)));
        } else {
            prop_assert_eq!(again.unwrap(), bytes);
        }
    }

    #[test]
    fn any_hex_run_limit_survives(body in text_like_body(), limit in 1usize..9) {
        let cs = CharsetTable::cp852();
        let bytes = Archive::new(vec![Section { index: 0, body_offset: 0 }], body).unwrap().to_bytes().unwrap();
        let options = DecompileOptions { hex_run_limit: NonZeroUsize::new(limit).unwrap() };
        let text = decompile_with(&bytes, &cs, options).unwrap();
        prop_assert_eq!(compile(&text, &cs).unwrap(), bytes);
    }

    #[test]
    fn garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let cs = CharsetTable::cp852();
        if let Err(e) = decompile(&data, &cs) {
            prop_assert!(e.location().1 == data.len());
        }
    }
}

#[test]
fn sample_texts_file() {
    let cs = CharsetTable::cp852();
    let source = "\
; TEXTS.FIL excerpt
SECTION 0
[00 01] \"Vítejte v QADAMu!\"
[02 00 05 01 FF 10] \"Stiskni klávesu…\" ; ellipsis is not in CP 852
";
    let err = compile(source, &cs).unwrap_err();
    assert!(matches!(err, CompileError::UnknownCharacter { line: 4, symbol: '…' }));
    assert_eq!(err.class(), ErrorClass::CharsetError);

    let source = source.replace('…', "...");
    let bytes = compile(&source, &cs).unwrap();
    let listing = decompile(&bytes, &cs).unwrap();
    assert!(listing.starts_with("SECTION 0\n"));
    assert!(listing.contains("Stiskni klávesu...\"\n"));
    assert_eq!(compile(&listing, &cs).unwrap(), bytes);
    assert_eq!(compile_reader(listing.as_bytes(), &cs).unwrap(), bytes);
}

#[test]
fn archive_model_round_trip() {
    let cs = CharsetTable::cp852();
    let bytes = compile("SECTION 0\n\"A\"\nSECTION 1\n[BEEF]\nSECTION 2\n", &cs).unwrap();
    let archive = Archive::from_bytes(&bytes).unwrap();
    assert_eq!(archive.sections().len(), 3);
    assert_eq!(archive.section_bytes(0), Some(&[obfuscate(b'A'), 0][..]));
    assert_eq!(archive.section_bytes(1), Some(&[0xBE, 0xEF][..]));
    assert_eq!(archive.section_bytes(2), Some(&[][..]));
    assert_eq!(archive.to_bytes().unwrap(), bytes);
}

#[test]
fn truncated_directory() {
    let cs = CharsetTable::cp852();
    assert_eq!(decompile(&[5, 0, 0], &cs), Err(FormatError::Truncated { offset: 3, needed: 19, len: 3 }));
}

#[cfg(feature = "serde")]
#[test]
fn archive_serializes() {
    let archive = Archive::new(vec![Section { index: 0, body_offset: 1 }], vec![7, 8]).unwrap();
    let json = serde_json::to_value(&archive).unwrap();
    assert_eq!(json["sections"][0]["body_offset"], 1);
    assert_eq!(json["body"], serde_json::json!([7, 8]));
}
