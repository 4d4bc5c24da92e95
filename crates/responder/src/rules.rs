use super::ReplyRule;

pub(crate) fn echo_fallback(prompt: &str) -> String {
    format!(
        "You said: \"{prompt}\". I'm currently running in simulated mode and can only provide pre-defined responses. Try asking about \"HTML\", \"JavaScript\", \"Python\", \"React\", or just say \"Hello\"!"
    )
}

fn explain_meaning(prompt: &str) -> String {
    let term = prompt.replacen("meaning of", "", 1);
    let term = term.trim();
    if term.is_empty() {
        "I can try to explain the meaning of something. What specifically would you like to know?"
            .to_string()
    } else {
        format!(
            "The meaning of \"{term}\" can vary depending on context. Could you provide more details, or are you looking for a general definition?"
        )
    }
}

/// The built-in table. Order matters: broad triggers such as `hi` and `java` shadow anything
/// listed after them.
pub fn default_rules() -> Vec<ReplyRule> {
    vec![
        ReplyRule::fixed(&["hello", "hi"], "Hello there! How can I help you today?"),
        ReplyRule::fixed(
            &["how are you"],
            "I am an AI, so I don't have feelings, but I am ready to assist you!",
        ),
        ReplyRule::fixed(
            &["what is your name"],
            "I am Gemini, a large language model, developed by Google.",
        ),
        ReplyRule::fixed(
            &["what can you do"],
            "I can answer questions, generate text, summarize information, and much more. What would you like to try?",
        ),
        ReplyRule::fixed(
            &["javascript", "js"],
            "JavaScript is a programming language that enables interactive web pages. It's a core technology of the World Wide Web, alongside HTML and CSS.",
        ),
        ReplyRule::fixed(
            &["html"],
            "HTML stands for HyperText Markup Language. It is the standard markup language for documents designed to be displayed in a web browser. It can be assisted by technologies like Cascading Style Sheets (CSS) and scripting languages like JavaScript.",
        ),
        ReplyRule::fixed(
            &["css"],
            "CSS (Cascading Style Sheets) is a stylesheet language used to describe the presentation of a document written in HTML or XML (including XML dialects such as SVG, MathML or XHTML). CSS describes how elements should be rendered on screen, on paper, in speech, or on other media.",
        ),
        ReplyRule::fixed(
            &["react"],
            "React is a free and open-source front-end JavaScript library for building user interfaces based on components. It's maintained by Meta and a community of individual developers and companies.",
        ),
        ReplyRule::fixed(
            &["python"],
            "Python is a high-level, general-purpose programming language. Its design philosophy emphasizes code readability with the use of significant indentation. Python is dynamically-typed and garbage-collected. It supports multiple programming paradigms, including structured (particularly procedural), object-oriented and functional programming.",
        ),
        ReplyRule::fixed(
            &["java"],
            "Java is a high-level, class-based, object-oriented programming language that is designed to have as few implementation dependencies as possible. It is a general-purpose programming language intended to let application developers write once, run anywhere (WORA), meaning that compiled Java code can run on all platforms that support Java without the need for recompilation.",
        ),
        ReplyRule::computed(&["meaning of"], explain_meaning),
        ReplyRule::fixed(
            &["thank you", "thanks"],
            "You're welcome! Is there anything else I can assist you with?",
        ),
        ReplyRule::fixed(&["goodbye", "bye"], "Goodbye! Have a great day!"),
        ReplyRule::fixed(
            &["weather"],
            "I cannot access real-time information like weather. I am a language model, not a weather service.",
        ),
        ReplyRule::fixed(
            &["time"],
            "I do not have a concept of current time or date. My knowledge is based on the data I was trained on.",
        ),
        ReplyRule::fixed(
            &["tell me a joke"],
            "Why don't scientists trust atoms? Because they make up everything!",
        ),
        ReplyRule::fixed(
            &["favorite color"],
            "As an AI, I don't have a favorite color, but I find all colors fascinating!",
        ),
        ReplyRule::fixed(
            &["what is the capital of france"],
            "The capital of France is Paris.",
        ),
        ReplyRule::fixed(
            &["who is elon musk"],
            "Elon Musk is a prominent entrepreneur and business magnate. He is the CEO of SpaceX and Tesla, Inc., among other ventures.",
        ),
        ReplyRule::fixed(
            &["how does ai work"],
            "AI works by analyzing vast amounts of data to learn patterns, make predictions, or perform tasks. Machine learning is a key part of this, where algorithms improve their performance over time without explicit programming.",
        ),
        ReplyRule::fixed(
            &["what is blockchain"],
            "Blockchain is a decentralized, distributed ledger technology that records transactions across many computers. It's most famously known as the underlying technology for cryptocurrencies like Bitcoin.",
        ),
        ReplyRule::fixed(
            &["tell me about yourself"],
            "I am a large language model, trained by Google. I am designed to assist with a wide range of tasks by processing and generating human-like text.",
        ),
        ReplyRule::fixed(
            &["do you have feelings"],
            "No, as an AI, I do not have feelings, emotions, or consciousness. I operate based on algorithms and data.",
        ),
        ReplyRule::fixed(
            &["recommend a book"],
            "I recommend \"Sapiens: A Brief History of Humankind\" by Yuval Noah Harari. It's a fascinating read about the history of our species.",
        ),
        ReplyRule::fixed(
            &["what is the internet"],
            "The Internet is a global system of interconnected computer networks that uses the Internet protocol suite (TCP/IP) to communicate between networks and devices. It's a network of networks that consists of private, public, academic, business, and government networks of local to global scope.",
        ),
        ReplyRule::fixed(
            &["how to learn programming"],
            "Start with the basics: choose a language like Python or JavaScript, learn fundamental concepts (variables, loops, functions), practice coding regularly, and build small projects. Online tutorials, courses, and documentation are great resources!",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_has_a_lowercase_trigger() {
        for rule in default_rules() {
            assert!(!rule.triggers.is_empty());
            for trigger in rule.triggers {
                assert_eq!(*trigger, trigger.to_lowercase());
            }
        }
    }

    #[test]
    fn meaning_term_keeps_original_casing() {
        assert_eq!(
            explain_meaning("meaning of  Rust  "),
            "The meaning of \"Rust\" can vary depending on context. Could you provide more details, or are you looking for a general definition?"
        );
    }
}
