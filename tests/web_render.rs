#![cfg(target_arch = "wasm32")]

use dom_morph::{dom::DomNode, select::SimpleSelector, web::WebLoader, Mutation, Options, Renderer, Source, Strategy};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlInputElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

fn body_with(html: &str) -> HtmlBodyElement {
	let _ = tracing_wasm::try_set_as_global_default();
	let body = window()
		.unwrap()
		.document()
		.unwrap()
		.body()
		.unwrap()
		.dyn_into::<HtmlBodyElement>()
		.unwrap();
	body.set_inner_html(html);
	body
}

fn first_child(node: &Node) -> Node {
	DomNode::child(node, 0).unwrap()
}

#[wasm_bindgen_test]
fn text_identity_is_preserved() {
	let body = body_with(r#"<div id="app">goodbye</div>"#);
	let target: Node = body.first_element_child().unwrap().into();
	let text = first_child(&target);

	let renderer = Renderer::new(WebLoader::new(), SimpleSelector);
	let (result, stats) = renderer
		.render_with_stats(Source::Markup(r#"<div id="app" class="greeting">hello</div>"#), &target, &Options::default())
		.unwrap();

	assert!(result.is_same_node(Some(&target)));
	assert!(first_child(&target).is_same_node(Some(&text)));
	assert_eq!(text.text_content().as_deref(), Some("hello"));
	assert_eq!(stats.get(Mutation::SetText), 1);
	assert_eq!(stats.get(Mutation::SetAttribute), 1);
}

#[wasm_bindgen_test]
fn user_input_is_reset() {
	let body = body_with(r#"<form id="f"><input value="initial"/></form>"#);
	let target: Node = body.first_element_child().unwrap().into();
	let input = first_child(&target).dyn_into::<HtmlInputElement>().unwrap();
	input.set_value("typed");

	let renderer = Renderer::new(WebLoader::new(), SimpleSelector);
	renderer
		.render(Source::Markup(r#"<form id="f" class="reset"><input value="initial"/></form>"#), &target, &Options::default())
		.unwrap();

	assert!(first_child(&target).is_same_node(Some(&input)));
	assert_eq!(input.value(), "initial");
}

#[wasm_bindgen_test]
fn comments_are_stripped() {
	let body = body_with(r#"<ul id="l"><!--x--><li>a</li><li>b</li></ul>"#);
	let target: Node = body.first_element_child().unwrap().into();

	let renderer = Renderer::new(WebLoader::new(), SimpleSelector);
	let (_, stats) = renderer
		.render_with_stats(
			Source::Markup(r#"<ul id="l"><li>a</li><!--y--></ul>"#),
			&target,
			&Options::default().ignore_comments(true).strategy(Strategy::Recurse),
		)
		.unwrap();

	assert_eq!(stats.get(Mutation::RemoveComment), 1);
	assert_eq!(stats.get(Mutation::RemoveChild), 1);
	assert_eq!(body.inner_html(), r#"<ul id="l"><li>a</li></ul>"#);
}

#[wasm_bindgen_test]
fn target_selector_scopes() {
	let body = body_with(r#"<main><p id="keep">k</p><section id="s"><span>old</span></section></main>"#);
	let main: Node = body.first_element_child().unwrap().into();
	let keep = first_child(&main);

	let renderer = Renderer::new(WebLoader::new(), SimpleSelector);
	let result = renderer
		.render(Source::Markup(r#"<section id="s"><span>new</span></section>"#), &main, &Options::default().target_selector("#s"))
		.unwrap();

	assert!(first_child(&main).is_same_node(Some(&keep)));
	assert_eq!(DomNode::parent(&result).map(|parent| parent.is_same_node(Some(&main))), Some(true));
	assert_eq!(body.inner_html(), r#"<main><p id="keep">k</p><section id="s"><span>new</span></section></main>"#);
}

#[wasm_bindgen_test]
fn malformed_markup_is_reported() {
	let body = body_with("<div></div>");
	let target: Node = body.first_element_child().unwrap().into();

	let renderer = Renderer::new(WebLoader::new(), SimpleSelector);
	assert!(renderer.render(Source::Markup("<div><p></div>"), &target, &Options::default()).is_err());
}

#[wasm_bindgen_test]
fn partial_markup_takes_the_target_namespace() {
	let body = body_with(r#"<svg><use></use></svg>"#);
	let svg: Node = body.first_element_child().unwrap().into();
	let use_ = first_child(&svg);

	let renderer = Renderer::new(WebLoader::new(), SimpleSelector);
	let result = renderer
		.render(Source::Markup(r#"<use xlink:href="blaat"></use>"#), &svg, &Options::default().target_selector("use"))
		.unwrap();

	assert!(result.is_same_node(Some(&use_)));
	let element = use_.dyn_ref::<web_sys::Element>().unwrap();
	assert_eq!(element.get_attribute_ns(Some("http://www.w3.org/1999/xlink"), "href").as_deref(), Some("blaat"));
}
