//! Canned strings spoken by the skill

pub const WELCOME: &str = "Welcome to the CareFinder Skill!";

pub const WHAT_DO_YOU_WANT: &str = "What do you want to ask?";

pub const SAY_THAT_AGAIN: &str = "Please say that again?";

pub const NOTIFY_MISSING_PERMISSIONS: &str =
    "Please enable Location permissions in the Amazon Alexa app.";

pub const NO_ADDRESS: &str = "It looks like you don't have an address set. Please set your address in the Amazon Alexa app.";

pub const NO_FULL_ADDRESS: &str = "It looks like you don't have a full address set. Please set your full address in the Amazon Alexa app.";

pub const ERROR: &str = "Uh Oh. Looks like something went wrong.";

pub const LOCATION_FAILURE: &str =
    "There was an error with the Device Address API. Please try again.";

pub const GEOCODE_FAILURE: &str =
    "I couldn't find your address on the map. Please check your address in the Amazon Alexa app.";

pub const NO_FACILITIES: &str =
    "I couldn't find any emergency rooms near you right now. Please try again later.";

pub const FOLLOW_UP_UNAVAILABLE: &str =
    "Sorry, I can't do that yet. You can ask for the closest ER, or say stop to exit.";

pub const GOODBYE: &str = "GoodBye! Thanks for using the CareFinder Skill!";

pub const UNHANDLED: &str = "This skill doesn't support that. Please ask something else.";

pub const HELP: &str = " You can use this skill by asking something like: What's the closest ER? \
Or, what's the closest ER near my address.";

pub const HELP_GENERIC: &str = " You can say Help or Stop any time.";

/// Follow-up commands appended to every closest-ER answer
pub const FOLLOW_UPS: &str = "Say next to show the second closest location. \
Say phone number to get the phone number. \
Say directions to get the driving directions. \
Or you can say stop to exit.";

/// Pause marker between spoken sentences
pub const BREAK: &str = "<break time=\"0.5s\"/>";
