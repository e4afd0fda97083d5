//! Self-contained HTML viewer: a d3-graphviz page that renders the embedded
//! DOT text client-side.

const PRELUDE: &str = r##"<!DOCTYPE html>
<meta charset="utf-8">
<body>
<script src="https://d3js.org/d3.v5.min.js"></script>
<script src="https://unpkg.com/@hpcc-js/wasm@0.3.11/dist/index.min.js"></script>
<script src="https://unpkg.com/d3-graphviz@3.0.5/build/d3-graphviz.js"></script>
<div id="graph" style="text-align: center;"></div>
<script>
var graphviz = d3.select("#graph").graphviz()
   .on("initEnd", () => { graphviz.renderDot(d3.select("#digraph").text()); });
</script>
"##;

pub fn format_html(dot: &str) -> String {
    format!("{PRELUDE}<div id=\"digraph\" style=\"display:none;\">{dot}</div>")
}
