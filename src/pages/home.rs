use leptos::prelude::*;
use serde_json::Value;

use crate::components::scene::SceneCanvas;
use crate::data::{
	ChartKind, FieldConfig, SampleRegistry, classify, parse_dataset, parse_field_config, prepare,
};

fn pretty(data: &Value) -> String {
	serde_json::to_string_pretty(data).unwrap_or_default()
}

/// Blank text stands for the default field names.
fn fields_text_of(fields: &FieldConfig) -> String {
	if *fields == FieldConfig::default() {
		String::new()
	} else {
		serde_json::to_string_pretty(fields).unwrap_or_default()
	}
}

/// Dataset picker, chart picker, JSON editors and the 3D scene.
#[component]
pub fn Home() -> impl IntoView {
	let registry = use_context::<SampleRegistry>().unwrap_or_else(SampleRegistry::builtin);
	let first = registry.iter().next().cloned();

	let text = RwSignal::new(first.as_ref().map(|s| pretty(&s.data)).unwrap_or_default());
	let fields_text = RwSignal::new(first.as_ref().map(|s| fields_text_of(&s.fields)).unwrap_or_default());
	let chart = RwSignal::new(first.as_ref().map_or(ChartKind::Bar, |s| s.chart));
	let resets = RwSignal::new(0u32);

	let prepared = Memo::new(move |_| {
		let fields = parse_field_config(&fields_text.get()).map_err(|e| e.to_string())?;
		let data = parse_dataset(&text.get()).map_err(|e| e.to_string())?;
		prepare(&data, chart.get(), &fields).map_err(|e| e.to_string())
	});
	let chart_data = Signal::derive(move || prepared.get().ok());
	let shape = Memo::new(move |_| {
		parse_dataset(&text.get())
			.map(|data| classify(&data).to_string())
			.unwrap_or_else(|_| "invalid".into())
	});

	let sample_buttons = registry
		.iter()
		.cloned()
		.map(|sample| {
			let (data, fields, kind) = (pretty(&sample.data), fields_text_of(&sample.fields), sample.chart);
			view! {
				<button
					class="sample"
					on:click=move |_| {
						text.set(data.clone());
						fields_text.set(fields.clone());
						chart.set(kind);
					}
				>
					{sample.name}
				</button>
			}
		})
		.collect_view();

	let chart_options = ChartKind::ALL
		.into_iter()
		.map(|kind| {
			view! {
				<option value=kind.slug() selected=move || chart.get() == kind>
					{kind.label()}
				</option>
			}
		})
		.collect_view();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="dashboard">
				<aside class="panel">
					<h2>"Samples"</h2>
					<div class="samples">{sample_buttons}</div>

					<label>
						"Chart "
						<select
							prop:value=move || chart.get().slug()
							on:change=move |ev| {
								if let Some(kind) = ChartKind::from_slug(&event_target_value(&ev)) {
									chart.set(kind);
								}
							}
						>
							{chart_options}
						</select>
					</label>
					<p class="shape">"Detected shape: " {move || shape.get()}</p>

					<label for="dataset">"Dataset (JSON)"</label>
					<textarea
						id="dataset"
						class="dataset"
						spellcheck="false"
						prop:value=move || text.get()
						on:input=move |ev| text.set(event_target_value(&ev))
					/>

					<label for="fields">"Field names (JSON, optional)"</label>
					<textarea
						id="fields"
						class="fields"
						spellcheck="false"
						placeholder="{ \"x\": \"month\", \"y\": \"region\", \"value\": \"sales\" }"
						prop:value=move || fields_text.get()
						on:input=move |ev| fields_text.set(event_target_value(&ev))
					/>

					{move || prepared.get().err().map(|e| view! { <div class="error-banner">{e}</div> })}
				</aside>

				<main class="stage">
					<SceneCanvas chart=chart_data reset=resets />
					<div class="graph-overlay">
						<h1>{move || format!("{} chart", chart.get().label())}</h1>
						<p class="subtitle">
							"Drag to orbit. Scroll to zoom. Hover for details. Click a point to focus it."
						</p>
						<button class="reset-view" on:click=move |_| resets.update(|n| *n += 1)>
							"Reset view"
						</button>
					</div>
				</main>
			</div>
		</ErrorBoundary>
	}
}
