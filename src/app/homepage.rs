use leptos::prelude::*;
use leptos_meta::Title;

use super::contact_panel::ContactPanel;

const BUILD_TIME: &str = env!("BUILD_TIME");

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <Title text="Portfolio" />
        <div class="max-w-5xl mx-auto page-content">
            <section id="hero" class="pt-16 pb-24 section-content">
                <h1 class="text-4xl sm:text-6xl font-bold">
                    <span class="text-2xl sm:text-4xl text-muted">"Hello, I'm"</span>
                    <br />
                    "Yash Verma"
                </h1>
                <p class="text-xl sm:text-2xl text-cyan font-medium mt-6">"Web Developer"</p>
                <p class="text-base mt-4 max-w-2xl leading-relaxed">
                    "I build fast, accessible web applications and enjoy turning rough ideas into polished products."
                </p>
                <a
                    href="#contact"
                    class="inline-block mt-8 bg-cyan/20 hover:bg-cyan/30 text-cyan px-6 py-3 rounded-md font-medium border border-cyan/30 transition-all duration-200"
                >
                    "Get in touch"
                </a>
            </section>
            <section id="contact" class="py-16 section-content">
                <h2 class="text-4xl font-bold mb-4">"Let's work together"</h2>
                <p class="mb-8 text-muted">
                    "Have a project in mind or just want to say hi? Drop a message and I'll get back to you."
                </p>
                <ContactPanel />
            </section>
            <footer class="py-8 text-sm text-muted text-center">
                "Last deployed " {BUILD_TIME}
            </footer>
        </div>
    }
}
