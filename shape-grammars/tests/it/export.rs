// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use shape_grammars::context::Context;
use shape_grammars::export::HeapExporter;
use shape_grammars::export::NoExport;

use crate::test_grammars::list;

#[test]
fn can_discard_exports() {
    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    let mut exporter = NoExport;
    exporter
        .export(&ctx, "abstract list", &heap)
        .expect("Cannot export");
    exporter
        .export(&ctx, "abstract list", &heap)
        .expect("Cannot export");
}

#[cfg(feature = "serde")]
#[test]
fn can_export_json_documents() {
    use pretty_assertions::assert_eq;
    use shape_grammars::export::ExportError;
    use shape_grammars::export::JsonExporter;

    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    let rule = list::recursive_rule(&mut ctx);
    let mut exporter = JsonExporter::new();
    assert!(exporter.is_empty());
    exporter
        .export(&ctx, "abstract list", &heap)
        .and_then(|_| exporter.export(&ctx, "recursive rule", &rule))
        .expect("Cannot export");
    assert_eq!(exporter.len(), 2);
    assert_eq!(
        exporter.documents().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["abstract list", "recursive rule"]
    );

    let document = exporter.get("abstract list").expect("Missing document");
    let parsed: shape_grammars::serde::HeapConfiguration =
        serde_json::from_str(document).expect("Cannot parse document");
    assert_eq!(parsed.load_into(&mut ctx).expect("Cannot load"), heap);

    assert_eq!(
        exporter.export(&ctx, "abstract list", &rule),
        Err(ExportError::DuplicateName("abstract list".to_string()))
    );
    assert_eq!(exporter.len(), 2);
    assert!(exporter.get("missing").is_none());
}
